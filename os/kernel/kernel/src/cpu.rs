//! The bootstrap processor.

use crate::gdt;
use core::arch::asm;
use kernel_bringup::{Cpu, DescriptorTablePointer};

/// Handle to the one CPU bring-up runs on.
pub struct X86Cpu(());

impl X86Cpu {
    /// # Safety
    /// Only one handle may exist; the panic path creates its own only once
    /// the kernel is beyond recovery.
    pub const unsafe fn new() -> Self {
        Self(())
    }
}

impl Cpu for X86Cpu {
    fn disable_interrupts(&mut self) {
        unsafe { asm!("cli", options(nomem, nostack)) };
    }

    fn enable_interrupts(&mut self) {
        unsafe { asm!("sti", options(nomem, nostack)) };
    }

    fn load_gdt(&mut self) {
        // SAFETY: bring-up runs with interrupts disabled.
        unsafe { gdt::load() };
    }

    unsafe fn load_idt(&mut self, pointer: &DescriptorTablePointer) {
        unsafe {
            asm!(
                "lidt [{}]",
                in(reg) core::ptr::from_ref(pointer),
                options(readonly, nostack, preserves_flags)
            );
        }
    }

    fn halt(&mut self) -> ! {
        loop {
            unsafe { asm!("cli", "hlt", options(nomem, nostack)) };
        }
    }
}

/// Sleep until the next interrupt, forever, running `on_wake` after each.
pub fn idle(mut on_wake: impl FnMut()) -> ! {
    loop {
        unsafe { asm!("hlt", options(nomem, nostack, preserves_flags)) };
        on_wake();
    }
}
