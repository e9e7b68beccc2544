//! # Interrupt Entry Stubs
//!
//! Naked entry points for the six installed vectors. The three faults never
//! return: they hand the faulting state to a Rust function that panics, which
//! paints the panic screen and halts. The three IRQ stubs save the
//! caller-saved registers, realign the stack, call a Rust handler and `iretq`.
//!
//! Vector | Stub | Error code
//! -------|------|-----------
//! 0x08   | [`double_fault_stub`] | yes (always 0)
//! 0x0D   | [`general_protection_stub`] | yes (selector)
//! 0x0E   | [`page_fault_stub`] | yes (see [`PageFaultError`])
//! base+0 | timer | no
//! base+1 | keyboard | no
//! base+12| mouse | no

use crate::{input, pic};
use bitfield_struct::bitfield;
use core::arch::naked_asm;
use core::sync::atomic::{AtomicU64, Ordering};
use kernel_bringup::pic::{IRQ_KEYBOARD, IRQ_MOUSE, IRQ_TIMER};
use kernel_bringup::GateHandlers;
use kernel_memory_addresses::VirtualAddress;

/// Page-fault error code.
#[bitfield(u64)]
pub struct PageFaultError {
    /// Protection violation rather than a non-present page.
    pub present: bool,
    pub write: bool,
    pub user: bool,
    pub reserved_bit: bool,
    pub instruction_fetch: bool,
    pub protection_key: bool,
    pub shadow_stack: bool,
    #[bits(57)]
    __: u64,
}

impl PageFaultError {
    pub const fn explain(&self) -> &'static str {
        if !self.present() {
            "non-present page"
        } else if self.reserved_bit() {
            "reserved bit set in a paging structure"
        } else if self.instruction_fetch() {
            "instruction fetch from a protected page"
        } else if self.write() {
            "write to a protected page"
        } else {
            "read from a protected page"
        }
    }
}

/// Fault entry with an error code: `rsi` = error code, `rdi` = `extra`.
///
/// The CPU pushed five words plus the error code onto a 16-byte aligned
/// stack, so `rsp` is already aligned for the call.
macro_rules! fault_stub {
    ($(#[$doc:meta])* $name:ident, $extra:literal => $handler:path) => {
        $(#[$doc])*
        #[unsafe(naked)]
        pub extern "C" fn $name() {
            naked_asm!(
                "cld",
                $extra,
                "mov rsi, [rsp]",
                "call {handler}",
                "ud2",
                handler = sym $handler,
            )
        }
    };
}

/// IRQ entry: save caller-saved registers, call `handler`, `iretq`.
macro_rules! irq_stub {
    ($name:ident => $handler:path) => {
        #[unsafe(naked)]
        pub extern "C" fn $name() {
            naked_asm!(
                "push rax", "push rcx", "push rdx", "push rsi", "push rdi",
                "push r8", "push r9", "push r10", "push r11",
                "push rbp",
                "mov rbp, rsp",
                "and rsp, -16",
                "cld",
                "call {handler}",
                "mov rsp, rbp",
                "pop rbp",
                "pop r11", "pop r10", "pop r9", "pop r8",
                "pop rdi", "pop rsi", "pop rdx", "pop rcx", "pop rax",
                "iretq",
                handler = sym $handler,
            )
        }
    };
}

fault_stub!(
    /// `#PF`: `rdi` = CR2.
    page_fault_stub, "mov rdi, cr2" => on_page_fault
);
fault_stub!(
    /// `#DF`: `rdi` = faulting RIP.
    double_fault_stub, "mov rdi, [rsp + 8]" => on_double_fault
);
fault_stub!(
    /// `#GP`: `rdi` = faulting RIP.
    general_protection_stub, "mov rdi, [rsp + 8]" => on_general_protection
);

irq_stub!(timer_stub => on_timer);
irq_stub!(keyboard_stub => on_keyboard);
irq_stub!(mouse_stub => on_mouse);

extern "C" fn on_page_fault(cr2: u64, error: u64) -> ! {
    let error = PageFaultError::from_bits(error);
    panic!(
        "Page Fault Detected at {:#018x}: {} (error {:#x})",
        cr2,
        error.explain(),
        error.into_bits()
    );
}

extern "C" fn on_double_fault(rip: u64, _error: u64) -> ! {
    panic!("Double Fault Detected (rip {rip:#018x})");
}

extern "C" fn on_general_protection(rip: u64, selector: u64) -> ! {
    panic!("General Protection Fault Detected (rip {rip:#018x}, selector {selector:#x})");
}

static TICKS: AtomicU64 = AtomicU64::new(0);

/// Timer interrupts since interrupts were enabled.
pub fn ticks() -> u64 {
    TICKS.load(Ordering::Relaxed)
}

extern "C" fn on_timer() {
    TICKS.fetch_add(1, Ordering::Relaxed);
    pic::end_of_interrupt(IRQ_TIMER);
}

extern "C" fn on_keyboard() {
    input::on_keyboard();
    pic::end_of_interrupt(IRQ_KEYBOARD);
}

extern "C" fn on_mouse() {
    input::on_mouse();
    pic::end_of_interrupt(IRQ_MOUSE);
}

fn entry(stub: extern "C" fn()) -> VirtualAddress {
    VirtualAddress::new(stub as usize as u64)
}

/// Entry points for [`install_gates`](kernel_bringup::install_gates).
pub fn handlers() -> GateHandlers {
    GateHandlers {
        page_fault: entry(page_fault_stub),
        double_fault: entry(double_fault_stub),
        general_protection: entry(general_protection_stub),
        keyboard: entry(keyboard_stub),
        mouse: entry(mouse_stub),
        timer: entry(timer_stub),
    }
}
