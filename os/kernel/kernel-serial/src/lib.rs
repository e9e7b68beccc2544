//! # COM1 Serial Diagnostics
//!
//! Polled 16550 UART output for early kernel diagnostics. Serial is the one
//! channel that works before paging, the heap or interrupts exist, so every
//! bring-up step and every fault message is mirrored here.
//!
//! ## Output Path
//! ```text
//! log::info!(..)          serial_trace!(..)
//!      ↓                        ↓
//! SerialLogger (log::Log)  ─────┤
//!                               ↓
//!                   COM1: spin::Mutex<SerialPort<Pio>>
//!                               ↓
//!                   poll LSR.THRE → out 0x3F8
//! ```
//!
//! ## Components
//! * [`PortIo`]: byte-wide port access. The hardware implementation is
//!   [`ports::Pio`]; tests inject a recording fake.
//! * [`SerialPort`]: the UART driver itself (115200 8N1, FIFO on). Implements
//!   [`core::fmt::Write`] and translates `\n` into `\r\n`.
//! * [`SerialLine`]: what a diagnostic sink needs from a serial line.
//! * [`SerialLogger`]: a `log::Log` that writes `"[LEVEL] target: message"`.
//! * [`serial_trace!`]: formatted output straight to COM1, bypassing `log`.
//!
//! The global port drops output until [`init_com1`] has programmed the UART,
//! so nothing touches the hardware before the kernel asks for it.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod logger;
pub mod ports;
mod uart;

pub use logger::SerialLogger;
pub use ports::PortIo;
pub use uart::{COM1, SerialLine, SerialPort};

use ports::Pio;
use spin::Mutex;

/// The machine's first serial port.
pub static COM1_PORT: Mutex<SerialPort<Pio>> =
    // SAFETY: COM1 is only driven through this lock.
    Mutex::new(SerialPort::new(unsafe { Pio::new() }, COM1));

/// Program the global COM1 UART. Output before this call is discarded.
pub fn init_com1() {
    COM1_PORT.lock().init();
}

#[doc(hidden)]
pub mod serial_fmt {
    use core::fmt::{self, Write};

    #[doc(hidden)]
    pub fn serial_write(args: fmt::Arguments) {
        let mut port = super::COM1_PORT.lock();
        if port.is_initialized() {
            // Best-effort debug output.
            let _ = port.write_fmt(args);
        }
    }
}

/// Write formatted text to COM1 without going through `log`.
#[macro_export]
macro_rules! serial_trace {
    ($($arg:tt)*) => {{
        $crate::serial_fmt::serial_write(core::format_args!($($arg)*));
    }};
}
