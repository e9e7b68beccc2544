use crate::serial_trace;
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

/// A `log::Log` that writes to COM1.
pub struct SerialLogger {
    max_level: LevelFilter,
}

impl SerialLogger {
    #[must_use]
    pub const fn new(max_level: LevelFilter) -> Self {
        Self { max_level }
    }

    /// Install as the global logger. Call once during early init.
    ///
    /// # Errors
    /// Fails if another logger has already been installed.
    pub fn init(self) -> Result<(), SetLoggerError> {
        static LOGGER: spin::Once<SerialLogger> = spin::Once::new();

        let max_level = self.max_level;
        let logger = LOGGER.call_once(|| self);
        log::set_logger(logger)?;
        log::set_max_level(max_level);
        Ok(())
    }
}

impl Log for SerialLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        serial_trace!(
            "[{}] {}: {}\n",
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    #[test]
    fn filters_by_level() {
        let logger = SerialLogger::new(LevelFilter::Info);
        let warn = Metadata::builder().level(Level::Warn).build();
        let debug = Metadata::builder().level(Level::Debug).build();
        assert!(logger.enabled(&warn));
        assert!(!logger.enabled(&debug));
    }

    #[test]
    fn logging_before_com1_init_is_dropped() {
        // COM1 is never programmed on the host; this must not touch ports.
        let logger = SerialLogger::new(LevelFilter::Trace);
        logger.log(
            &Record::builder()
                .level(Level::Info)
                .target("test")
                .args(format_args!("hello"))
                .build(),
        );
    }
}
