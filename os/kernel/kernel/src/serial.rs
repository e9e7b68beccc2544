//! COM1 as a [`SerialLine`].

use core::fmt::{self, Write};
use kernel_serial::{COM1_PORT, SerialLine};

/// Handle to the global COM1 port.
pub struct Com1;

impl Write for Com1 {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let mut port = COM1_PORT.lock();
        if port.is_initialized() {
            port.write_str(s)?;
        }
        Ok(())
    }
}

impl SerialLine for Com1 {
    fn init(&mut self) {
        kernel_serial::init_com1();
    }
}
