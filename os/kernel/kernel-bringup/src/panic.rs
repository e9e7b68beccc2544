//! # Kernel Panic Screen

use crate::DiagnosticSink;
use crate::platform::{Console, Cpu};
use core::fmt;
use kernel_serial::SerialLine;

/// Background of the panic screen (`0x00RRGGBB`).
pub const ALERT_BACKGROUND: u32 = 0x00FF_0000;

/// Text colour on the panic screen.
pub const ALERT_FOREGROUND: u32 = 0x0000_0000;

const BANNER: &str = "================================================================";

/// Disable interrupts, paint the panic screen with `message` and halt.
///
/// Assumes nothing else will run afterwards; calling it re-entrantly simply
/// paints the screen again.
pub fn halt<S, R, C>(sink: &mut DiagnosticSink<S, R>, cpu: &mut C, message: &dyn fmt::Display) -> !
where
    S: SerialLine,
    R: Console,
    C: Cpu,
{
    cpu.disable_interrupts();

    let console = sink.console();
    console.clear(ALERT_BACKGROUND);
    console.home();
    console.set_foreground(ALERT_FOREGROUND);

    sink.emit(format_args!("{BANNER}"));
    sink.emit(format_args!("KERNEL PANIC"));
    sink.emit(format_args!("{BANNER}"));
    sink.emit(format_args!(""));
    sink.emit(format_args!("Error: {message}"));
    sink.emit(format_args!(""));
    sink.emit(format_args!("The kernel has encountered an unrecoverable error."));
    sink.emit(format_args!("The system will halt."));

    cpu.halt()
}
