use crate::panic;
use crate::platform::{Console, Cpu};
use core::fmt;
use kernel_serial::SerialLine;

/// Where bring-up reports progress: the text console and, once programmed,
/// the serial line.
pub struct DiagnosticSink<S, R> {
    serial: S,
    console: R,
    serial_ready: bool,
    warnings: usize,
}

impl<S: SerialLine, R: Console> DiagnosticSink<S, R> {
    /// A sink that writes to the console only until [`init`](Self::init).
    pub const fn new(serial: S, console: R) -> Self {
        Self {
            serial,
            console,
            serial_ready: false,
            warnings: 0,
        }
    }

    /// A sink over a serial line that has already been programmed.
    pub const fn attached(serial: S, console: R) -> Self {
        Self {
            serial,
            console,
            serial_ready: true,
            warnings: 0,
        }
    }

    /// Program the serial line; later lines go to both outputs.
    pub fn init(&mut self) {
        self.serial.init();
        self.serial_ready = true;
    }

    /// Write one line.
    pub fn emit(&mut self, args: fmt::Arguments<'_>) {
        // Output is best effort; a broken console must not stop bring-up.
        let _ = self.console.write_fmt(args);
        let _ = self.console.write_char('\n');
        if self.serial_ready {
            let _ = self.serial.write_fmt(args);
            let _ = self.serial.write_char('\n');
        }
    }

    /// Write one line to the serial line only, for text the console showed
    /// before [`init`](Self::init).
    pub fn emit_serial(&mut self, args: fmt::Arguments<'_>) {
        if self.serial_ready {
            let _ = self.serial.write_fmt(args);
            let _ = self.serial.write_char('\n');
        }
    }

    /// Write a line flagged as a degraded path and count it.
    pub fn warn(&mut self, args: fmt::Arguments<'_>) {
        self.warnings += 1;
        self.emit(format_args!("[!] {args}"));
    }

    /// Number of [`warn`](Self::warn) calls so far.
    #[must_use]
    pub const fn warnings(&self) -> usize {
        self.warnings
    }

    pub const fn console(&mut self) -> &mut R {
        &mut self.console
    }

    pub const fn serial(&mut self) -> &mut S {
        &mut self.serial
    }

    /// Report `message` on the panic screen and stop the machine.
    pub fn halt<C: Cpu>(&mut self, cpu: &mut C, message: &dyn fmt::Display) -> ! {
        panic::halt(self, cpu, message)
    }
}
