//! # Interrupt Gate Table
//!
//! The 256-entry x86-64 IDT. Bring-up fills exactly six gates and leaves every
//! other entry zeroed ("not present"); the CPU turns a vector without a present
//! gate into a general protection fault, escalating to a double fault.
//!
//! ```text
//! vector  source                         handler
//! 0x08    #DF double fault               GateHandlers::double_fault
//! 0x0D    #GP general protection fault   GateHandlers::general_protection
//! 0x0E    #PF page fault                 GateHandlers::page_fault
//! base+0  IRQ0  PIT timer                GateHandlers::timer
//! base+1  IRQ1  PS/2 keyboard            GateHandlers::keyboard
//! base+12 IRQ12 PS/2 mouse               GateHandlers::mouse
//! ```
//!
//! All six are interrupt gates (type 0xE, DPL 0, present: attribute byte
//! `0x8E`) at the kernel code selector `0x08`.

use crate::pic::{IRQ_KEYBOARD, IRQ_MOUSE, IRQ_TIMER, PicOffsets};
use crate::platform::{AddressSpaceManager, Cpu};
use crate::BringUpError;
use bitfield_struct::bitfield;
use kernel_memory_addresses::{PhysicalAddress, VirtualAddress};

pub const VECTOR_DOUBLE_FAULT: u8 = 0x08;
pub const VECTOR_GENERAL_PROTECTION: u8 = 0x0D;
pub const VECTOR_PAGE_FAULT: u8 = 0x0E;

/// GDT selector of the flat 64-bit kernel code segment.
pub const KERNEL_CODE_SELECTOR: u16 = 0x08;

const ENTRIES: usize = 256;

const _: () = assert!(size_of::<GateEntry>() == 16);
const _: () = assert!(size_of::<InterruptGateTable>() == 4096);
const _: () = assert!(align_of::<InterruptGateTable>() == 16);

/// Middle two bytes of a gate: IST index and the type/attribute byte.
#[bitfield(u16)]
#[derive(PartialEq, Eq)]
pub struct GateAttr {
    /// Interrupt Stack Table index (0 = no stack switch).
    #[bits(3)]
    pub ist: u8,

    #[bits(5)]
    __zero0: u8,

    /// 0xE = interrupt gate, 0xF = trap gate.
    #[bits(4)]
    pub typ: u8,

    /// Must be 0 for interrupt/trap gates.
    #[bits(1)]
    pub s: bool,

    #[bits(2)]
    pub dpl: u8,

    #[bits(1)]
    pub present: bool,
}

/// Gate kinds.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum GateType {
    /// Clears IF on entry.
    Interrupt,
    /// Leaves IF unchanged.
    Trap,
}

impl GateAttr {
    /// A present ring-0 gate of the given type.
    #[must_use]
    pub const fn kernel(typ: GateType) -> Self {
        let raw = match typ {
            GateType::Interrupt => 0xE,
            GateType::Trap => 0xF,
        };
        Self::new().with_typ(raw).with_s(false).with_dpl(0).with_present(true)
    }

    /// The attribute byte as it is usually written (`0x8E` for a kernel interrupt gate).
    #[must_use]
    pub const fn type_attr(self) -> u8 {
        (self.into_bits() >> 8) as u8
    }
}

/// One 16-byte gate descriptor.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GateEntry {
    offset_lo: u16,
    selector: u16,
    attr: u16,
    offset_mid: u16,
    offset_hi: u32,
    zero: u32,
}

impl GateEntry {
    pub const MISSING: Self = Self {
        offset_lo: 0,
        selector: 0,
        attr: 0,
        offset_mid: 0,
        offset_hi: 0,
        zero: 0,
    };

    #[allow(clippy::cast_possible_truncation)]
    const fn new(handler: VirtualAddress, attr: GateAttr, selector: u16) -> Self {
        let addr = handler.as_u64();
        Self {
            offset_lo: addr as u16,
            selector,
            attr: attr.into_bits(),
            offset_mid: (addr >> 16) as u16,
            offset_hi: (addr >> 32) as u32,
            zero: 0,
        }
    }

    #[must_use]
    pub const fn handler(&self) -> VirtualAddress {
        VirtualAddress::new(
            (self.offset_lo as u64) | ((self.offset_mid as u64) << 16) | ((self.offset_hi as u64) << 32),
        )
    }

    #[must_use]
    pub const fn selector(&self) -> u16 {
        self.selector
    }

    #[must_use]
    pub const fn attr(&self) -> GateAttr {
        GateAttr::from_bits(self.attr)
    }

    #[must_use]
    pub const fn is_present(&self) -> bool {
        self.attr().present()
    }

    /// Still in its never-installed state.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        *self == Self::MISSING
    }
}

/// Operand of `lidt`/`lgdt`: byte limit and linear base.
#[repr(C, packed)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DescriptorTablePointer {
    /// Size of the table in bytes, minus one.
    pub limit: u16,
    pub base: VirtualAddress,
}

/// The full 256-vector table.
#[repr(C, align(16))]
pub struct InterruptGateTable {
    entries: [GateEntry; ENTRIES],
}

impl Default for InterruptGateTable {
    fn default() -> Self {
        Self::new()
    }
}

impl InterruptGateTable {
    /// Every gate not present.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: [GateEntry::MISSING; ENTRIES],
        }
    }

    /// Install `handler` at `vector`.
    pub const fn set_gate(&mut self, vector: u8, handler: VirtualAddress, typ: GateType, selector: u16) {
        self.entries[vector as usize] = GateEntry::new(handler, GateAttr::kernel(typ), selector);
    }

    #[must_use]
    pub const fn entry(&self, vector: u8) -> &GateEntry {
        &self.entries[vector as usize]
    }

    pub fn entries(&self) -> impl Iterator<Item = (u8, &GateEntry)> {
        (0..=u8::MAX).zip(self.entries.iter())
    }

    /// The `lidt` operand covering all 256 entries.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn pointer(&self) -> DescriptorTablePointer {
        DescriptorTablePointer {
            limit: (size_of::<Self>() - 1) as u16,
            base: VirtualAddress::from_ptr(core::ptr::from_ref(self)),
        }
    }
}

/// Entry points of the six handlers bring-up installs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateHandlers {
    pub page_fault: VirtualAddress,
    pub double_fault: VirtualAddress,
    pub general_protection: VirtualAddress,
    pub keyboard: VirtualAddress,
    pub mouse: VirtualAddress,
    pub timer: VirtualAddress,
}

impl GateHandlers {
    /// `(vector, handler)` pairs for PICs remapped to `offsets`.
    #[must_use]
    pub const fn vectors(&self, offsets: PicOffsets) -> [(u8, VirtualAddress); 6] {
        [
            (VECTOR_PAGE_FAULT, self.page_fault),
            (VECTOR_DOUBLE_FAULT, self.double_fault),
            (VECTOR_GENERAL_PROTECTION, self.general_protection),
            (offsets.vector(IRQ_KEYBOARD), self.keyboard),
            (offsets.vector(IRQ_MOUSE), self.mouse),
            (offsets.vector(IRQ_TIMER), self.timer),
        ]
    }
}

/// Build the gate table in a fresh page, install the six gates and load it.
///
/// Returns the pointer that was loaded and the frame holding the table.
///
/// # Errors
/// No frame left for the table.
pub fn install_gates<M, C>(
    memory: &mut M,
    cpu: &mut C,
    handlers: &GateHandlers,
    offsets: PicOffsets,
) -> Result<(DescriptorTablePointer, PhysicalAddress), BringUpError>
where
    M: AddressSpaceManager,
    C: Cpu,
{
    let frame = memory
        .request_page()
        .ok_or(BringUpError::OutOfFrames("interrupt gate table"))?;

    // SAFETY: the frame is freshly allocated, identity mapped (step 4) and
    // page sized, so it holds exactly one table at 16-byte alignment.
    let table = unsafe {
        let ptr = memory.phys_to_ptr(frame).cast::<InterruptGateTable>();
        ptr.write(InterruptGateTable::new());
        &mut *ptr
    };

    for (vector, handler) in handlers.vectors(offsets) {
        table.set_gate(vector, handler, GateType::Interrupt, KERNEL_CODE_SELECTOR);
        log::trace!("gate {vector:#04x} -> {handler}");
    }

    let pointer = table.pointer();
    // SAFETY: the frame is reserved for the table for the life of the kernel.
    unsafe { cpu.load_idt(&pointer) };
    Ok((pointer, frame))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_interrupt_gate_is_0x8e() {
        assert_eq!(GateAttr::kernel(GateType::Interrupt).type_attr(), 0x8E);
        assert_eq!(GateAttr::kernel(GateType::Trap).type_attr(), 0x8F);
    }

    #[test]
    fn handler_address_round_trips_through_split_offsets() {
        let mut table = InterruptGateTable::new();
        let handler = VirtualAddress::new(0xFFFF_8000_1234_5678);
        table.set_gate(0x21, handler, GateType::Interrupt, KERNEL_CODE_SELECTOR);
        let e = table.entry(0x21);
        assert_eq!(e.handler(), handler);
        assert_eq!(e.selector(), 0x08);
        assert!(e.is_present());
        assert!(table.entry(0x22).is_missing());
    }

    #[test]
    fn limit_covers_all_vectors() {
        let table = InterruptGateTable::new();
        let pointer = table.pointer();
        assert_eq!({ pointer.limit }, 0x0FFF);
    }
}
