//! # Collaborator Contracts
//!
//! The narrow interfaces bring-up needs from the machine. Each is implemented
//! once by the kernel binary over real hardware; tests substitute recorders.

use crate::gates::{DescriptorTablePointer, GateHandlers};
use crate::{DiagnosticSink, HeapError, MapError, PicMasks, PicOffsets};
use alloc::boxed::Box;
use core::fmt;
use kernel_memory_addresses::{PageRange, PhysicalAddress, Size4K, VirtualAddress};
use kernel_pci::{PciDriver, PciFunction};
use kernel_serial::SerialLine;

/// Processor control.
pub trait Cpu {
    /// `cli`
    fn disable_interrupts(&mut self);

    /// `sti`
    fn enable_interrupts(&mut self);

    /// Load the flat kernel GDT and reload the segment registers.
    fn load_gdt(&mut self);

    /// Load `pointer` into the IDTR.
    ///
    /// # Safety
    /// The table must stay mapped and unchanged in place for as long as
    /// interrupts can be delivered through it, and every present gate must
    /// point at a valid handler.
    unsafe fn load_idt(&mut self, pointer: &DescriptorTablePointer);

    /// Stop executing for good.
    fn halt(&mut self) -> !;
}

/// Physical frame allocation and the kernel's page tables.
///
/// Bring-up only sequences calls to this contract; frame bookkeeping and
/// page-table encoding stay with the implementation.
pub trait AddressSpaceManager {
    /// Never hand out the `pages` frames starting at `base`.
    fn reserve(&mut self, base: PhysicalAddress, pages: u64);

    /// Take one free frame.
    fn request_page(&mut self) -> Option<PhysicalAddress>;

    /// Adopt the zeroed frame at `root` as the top-level table that
    /// [`map`](Self::map) edits from now on.
    fn install(&mut self, root: PhysicalAddress);

    /// Map the 4 KiB page at `virt` to the frame at `phys`.
    ///
    /// # Errors
    /// Out of frames for intermediate tables, or a misaligned address.
    fn map(&mut self, virt: VirtualAddress, phys: PhysicalAddress) -> Result<(), MapError>;

    /// Make `root` the live address space (CR3).
    fn activate(&mut self, root: PhysicalAddress);

    /// Where the kernel can currently reach physical memory at `phys`.
    ///
    /// The pointer may only be dereferenced while `phys` is mapped there.
    fn phys_to_ptr(&self, phys: PhysicalAddress) -> *mut u8;

    /// Identity-map the page holding `phys` and return its virtual address.
    ///
    /// # Errors
    /// See [`map`](Self::map).
    fn identity_map(&mut self, phys: PhysicalAddress) -> Result<VirtualAddress, MapError> {
        let page = phys.align_down::<Size4K>();
        self.map(VirtualAddress::new(page.as_u64()), page)?;
        Ok(VirtualAddress::new(phys.as_u64()))
    }
}

/// The kernel heap, backed by pages from `M`.
pub trait HeapAllocator<M: AddressSpaceManager> {
    /// Map `pages` pages at `base` and start serving allocations from them.
    ///
    /// # Errors
    /// The backing pages could not be mapped, or the range is unusable.
    fn init(&mut self, memory: &mut M, base: VirtualAddress, pages: u64) -> Result<(), HeapError>;
}

/// The legacy interrupt controller pair.
pub trait InterruptController {
    /// Reinitialize both controllers with new vector bases.
    fn remap(&mut self, offsets: PicOffsets);

    fn set_masks(&mut self, masks: PicMasks);
}

/// Keyboard, mouse and whatever else needs poking before interrupts flow.
pub trait InputDevices {
    fn init(&mut self);
}

/// The visual text output.
pub trait Console: fmt::Write {
    /// Fill the screen with `background`.
    fn clear(&mut self, background: u32);

    /// Put the cursor at the top-left corner.
    fn home(&mut self);

    fn set_foreground(&mut self, colour: u32);
}

/// One concrete set of collaborators.
pub trait Platform {
    type Cpu: Cpu;
    type Memory: AddressSpaceManager;
    type Heap: HeapAllocator<Self::Memory>;
    type Pic: InterruptController;
    type Input: InputDevices;
    type Serial: SerialLine;
    type Console: Console;

    /// Construct the driver for an AHCI 1.0 controller.
    fn ahci_driver(function: &PciFunction) -> Box<dyn PciDriver>;
}

/// The collaborator instances handed to [`bring_up`](crate::bring_up).
pub struct Machine<P: Platform> {
    pub cpu: P::Cpu,
    pub memory: P::Memory,
    pub heap: P::Heap,
    pub pic: P::Pic,
    pub input: P::Input,
    pub sink: DiagnosticSink<P::Serial, P::Console>,
    /// Frames occupied by the kernel image.
    pub kernel_image: PageRange<Size4K>,
    /// Entry points for the gates installed at step 7.
    pub handlers: GateHandlers,
}
