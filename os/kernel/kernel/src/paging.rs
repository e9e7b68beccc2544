//! # Four-Level Page Tables
//!
//! The kernel's [`AddressSpaceManager`]: a frame bitmap plus a PML4 rooted
//! address space. Every table frame comes from the bitmap and is reached
//! through the identity map, first the firmware's and then our own.
//!
//! ```text
//! 63      48 47   39 38   30 29   21 20   12 11      0
//! ┌─────────┬───────┬───────┬───────┬───────┬─────────┐
//! │  sign   │ PML4  │ PDPT  │  PD   │  PT   │ offset  │
//! └─────────┴───────┴───────┴───────┴───────┴─────────┘
//! ```

use crate::frames::FrameBitmap;
use bitfield_struct::bitfield;
use kernel_bringup::{AddressSpaceManager, MapError};
use kernel_info::memory::PAGE_SIZE;
use kernel_memory_addresses::{PhysicalAddress, Size4K, VirtualAddress};

/// One entry at any level; only 4 KiB leaves are created here.
#[bitfield(u64)]
pub struct PageTableEntry {
    pub present: bool,
    pub writable: bool,
    pub user: bool,
    pub write_through: bool,
    pub cache_disabled: bool,
    pub accessed: bool,
    pub dirty: bool,
    /// Large page at PDPT/PD level.
    pub huge: bool,
    pub global: bool,
    #[bits(3)]
    pub available: u8,
    #[bits(40)]
    pub frame: u64,
    #[bits(11)]
    pub available_hi: u16,
    pub no_execute: bool,
}

impl PageTableEntry {
    fn address(self) -> PhysicalAddress {
        PhysicalAddress::new(self.frame() << 12)
    }

    fn pointing_to(frame: PhysicalAddress) -> Self {
        Self::new()
            .with_present(true)
            .with_writable(true)
            .with_frame(frame.as_u64() >> 12)
    }
}

#[repr(C, align(4096))]
pub struct PageTable([PageTableEntry; 512]);

/// Table index of `virt` at `level` (3 = PML4, 0 = PT).
#[allow(clippy::cast_possible_truncation)]
const fn index(virt: VirtualAddress, level: u32) -> usize {
    ((virt.as_u64() >> (12 + 9 * level)) & 0x1FF) as usize
}

pub struct KernelMemory {
    frames: FrameBitmap,
    root: Option<PhysicalAddress>,
}

impl KernelMemory {
    pub const fn new(frames: FrameBitmap) -> Self {
        Self { frames, root: None }
    }

    pub const fn frames(&self) -> &FrameBitmap {
        &self.frames
    }

    /// # Safety
    /// `frame` must hold a page table reachable through the identity map.
    unsafe fn table<'a>(frame: PhysicalAddress) -> &'a mut PageTable {
        unsafe { &mut *(frame.as_u64() as *mut PageTable) }
    }

    /// The table `entry` points to, creating it if absent.
    #[allow(clippy::cast_possible_truncation)]
    fn descend(&mut self, entry: &mut PageTableEntry, virt: VirtualAddress) -> Result<PhysicalAddress, MapError> {
        if entry.present() {
            if entry.huge() {
                return Err(MapError::AlreadyMapped {
                    virt,
                    existing: entry.address(),
                });
            }
            return Ok(entry.address());
        }
        let frame = self.frames.request().ok_or(MapError::OutOfFrames)?;
        // SAFETY: fresh frame, identity reachable.
        unsafe { (frame.as_u64() as *mut u8).write_bytes(0, PAGE_SIZE as usize) };
        *entry = PageTableEntry::pointing_to(frame);
        Ok(frame)
    }
}

impl AddressSpaceManager for KernelMemory {
    fn reserve(&mut self, base: PhysicalAddress, pages: u64) {
        self.frames.reserve(base, pages);
    }

    fn request_page(&mut self) -> Option<PhysicalAddress> {
        self.frames.request()
    }

    fn install(&mut self, root: PhysicalAddress) {
        self.root = Some(root);
    }

    fn map(&mut self, virt: VirtualAddress, phys: PhysicalAddress) -> Result<(), MapError> {
        if !virt.is_aligned::<Size4K>() {
            return Err(MapError::Misaligned(virt));
        }
        let mut table = self.root.ok_or(MapError::NoTable)?;

        for level in (1..=3).rev() {
            // SAFETY: `table` is the root or was produced by `descend`.
            let entry = &mut unsafe { Self::table(table) }.0[index(virt, level)];
            table = self.descend(entry, virt)?;
        }

        let leaf = &mut unsafe { Self::table(table) }.0[index(virt, 0)];
        let phys = phys.align_down::<Size4K>();
        if leaf.present() && leaf.address() != phys {
            return Err(MapError::AlreadyMapped {
                virt,
                existing: leaf.address(),
            });
        }
        *leaf = PageTableEntry::pointing_to(phys);
        Ok(())
    }

    fn activate(&mut self, root: PhysicalAddress) {
        // SAFETY: the new tables identity-map everything the kernel touches,
        // including the code executing here.
        unsafe {
            core::arch::asm!(
                "mov cr3, {}",
                in(reg) root.as_u64(),
                options(nostack, preserves_flags)
            );
        }
        log::debug!("CR3 <- {root}");
    }

    fn phys_to_ptr(&self, phys: PhysicalAddress) -> *mut u8 {
        phys.as_u64() as *mut u8
    }
}
