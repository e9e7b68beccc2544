//! # Global Descriptor Table
//!
//! Long mode ignores base and limit for code and data segments, but `CS` must
//! still reference a present 64-bit code descriptor and `DS`/`ES`/`SS` a
//! present data descriptor. The kernel runs in ring 0 only, so the table is
//! three entries:
//!
//! Index | Selector | Meaning
//! ------|----------|--------
//! 0     | 0x00     | Null
//! 1     | 0x08     | Kernel code (64-bit, DPL 0; [`KERNEL_CS`])
//! 2     | 0x10     | Kernel data (DPL 0; [`KERNEL_DS`])
//!
//! [`KERNEL_CS`] is the selector every interrupt gate references.

use bitfield_struct::bitfield;
use kernel_bringup::gates::KERNEL_CODE_SELECTOR;
use kernel_memory_addresses::VirtualAddress;

pub const KERNEL_CS: u16 = 1 << 3;
pub const KERNEL_DS: u16 = 2 << 3;

const _: () = assert!(KERNEL_CS == KERNEL_CODE_SELECTOR);

/// An 8-byte code or data segment descriptor.
///
/// Only `typ`, `s`, `dpl`, `p` and `l` matter in long mode.
#[bitfield(u64)]
pub struct SegmentDescriptor {
    pub limit_lo: u16, // [15:0]
    pub base_lo: u16,  // [31:16]
    pub base_mid: u8,  // [39:32]
    #[bits(4)]
    pub typ: u8, // [43:40]
    pub s: bool, // [44] code/data
    #[bits(2)]
    pub dpl: u8, // [46:45]
    pub p: bool, // [47]
    #[bits(4)]
    pub limit_hi: u8, // [51:48]
    pub avl: bool,    // [52]
    pub l: bool,      // [53] 64-bit code
    pub db: bool,     // [54] must be 0 when L=1
    pub g: bool,      // [55]
    pub base_hi: u8,  // [63:56]
}

impl SegmentDescriptor {
    /// Ring-0 64-bit code: execute + read.
    pub const fn kernel_code() -> Self {
        Self::new()
            .with_typ(0b1010)
            .with_s(true)
            .with_dpl(0)
            .with_p(true)
            .with_l(true)
            .with_db(false)
    }

    /// Ring-0 data: read + write.
    pub const fn kernel_data() -> Self {
        Self::new()
            .with_typ(0b0010)
            .with_s(true)
            .with_dpl(0)
            .with_p(true)
    }
}

#[repr(C, align(16))]
pub struct Gdt {
    null: SegmentDescriptor,
    kcode: SegmentDescriptor,
    kdata: SegmentDescriptor,
}

impl Gdt {
    pub const fn new() -> Self {
        Self {
            null: SegmentDescriptor::new(),
            kcode: SegmentDescriptor::kernel_code(),
            kdata: SegmentDescriptor::kernel_data(),
        }
    }
}

/// Operand of `lgdt`.
#[repr(C, packed)]
struct DescTablePtr {
    limit: u16,
    base: VirtualAddress,
}

static GDT: Gdt = Gdt::new();

/// Load [`GDT`], reload the data segments and far-return into the new `CS`.
///
/// # Safety
/// Interrupts must be disabled.
#[allow(clippy::cast_possible_truncation)]
pub unsafe fn load() {
    let ptr = DescTablePtr {
        limit: (size_of::<Gdt>() - 1) as u16,
        base: VirtualAddress::from_ptr(&raw const GDT),
    };

    unsafe {
        core::arch::asm!(
            "lgdt [{}]",
            in(reg) &raw const ptr,
            options(readonly, nostack, preserves_flags)
        );

        core::arch::asm!(
            "mov ds, {0:x}",
            "mov es, {0:x}",
            "mov ss, {0:x}",
            "mov fs, {0:x}",
            "mov gs, {0:x}",
            in(reg) KERNEL_DS,
            options(nostack, preserves_flags)
        );

        // Far reload of CS via retfq.
        core::arch::asm!(
            "push {cs}",
            "lea {tmp}, [rip + 2f]",
            "push {tmp}",
            "retfq",
            "2:",
            cs = in(reg) u64::from(KERNEL_CS),
            tmp = lateout(reg) _,
        );
    }
}
