//! # x86 I/O Port Access

/// Byte-wide access to the legacy I/O port space.
///
/// Implementations are trusted to talk to the port they are asked for; the
/// unsafety of raw port I/O is discharged when the implementation is created.
pub trait PortIo {
    fn write(&mut self, port: u16, value: u8);
    fn read(&mut self, port: u16) -> u8;
}

/// The real `in`/`out` instructions.
#[derive(Debug)]
pub struct Pio(());

impl Pio {
    /// # Safety
    /// Only usable at CPL0 (or with a permissive IOPL). Whoever holds a `Pio`
    /// can write any port, so hand it only to drivers that own their ports.
    #[must_use]
    pub const unsafe fn new() -> Self {
        Self(())
    }
}

impl PortIo for Pio {
    #[inline]
    fn write(&mut self, port: u16, value: u8) {
        // SAFETY: see `Pio::new`.
        unsafe { outb(port, value) }
    }

    #[inline]
    fn read(&mut self, port: u16) -> u8 {
        // SAFETY: see `Pio::new`.
        unsafe { inb(port) }
    }
}

/// Write one byte to an I/O port (`out dx, al`).
///
/// # Safety
/// - **Privilege:** execute at CPL0 or with I/O permission for `port`,
///   otherwise the CPU raises `#GP`.
/// - **Correct port:** `port` must belong to the intended device and the
///   device must be in a state that accepts `val`.
/// - **Ordering:** `out` is not a memory fence.
#[inline]
pub unsafe fn outb(port: u16, val: u8) {
    unsafe {
        core::arch::asm!("out dx, al", in("dx") port, in("al") val, options(nomem, nostack, preserves_flags));
    }
}

/// Read one byte from an I/O port (`in al, dx`).
///
/// # Safety
/// Same requirements as [`outb`]; reading some device registers has side
/// effects (e.g. popping a FIFO).
#[inline]
pub unsafe fn inb(port: u16) -> u8 {
    let mut v: u8;
    unsafe {
        core::arch::asm!("in al, dx", in("dx") port, out("al") v, options(nomem, nostack, preserves_flags));
    }
    v
}
