//! # UEFI Memory Map
//!
//! The firmware reports memory as an array of `EFI_MEMORY_DESCRIPTOR`s. The
//! distance between entries is `desc_size`, which may exceed
//! `size_of::<MemoryDescriptor>()` on newer firmware, so the array is always
//! walked by stride and never indexed as a Rust slice.

use crate::memory::PAGE_SIZE;

/// Location and shape of the raw memory map.
#[repr(C)]
#[derive(Clone, Debug)]
pub struct MemoryMapInfo {
    /// Pointer to the first descriptor.
    pub ptr: u64,

    /// Length of the memory map buffer in **bytes**.
    pub size: u64,

    /// Stride between descriptors in bytes.
    pub desc_size: u64,
}

/// `EFI_MEMORY_DESCRIPTOR` (version 1).
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct MemoryDescriptor {
    pub typ: u32,
    pub _pad: u32,
    pub phys_start: u64,
    pub virt_start: u64,
    pub pages: u64,
    pub attributes: u64,
}

impl MemoryDescriptor {
    /// `EfiConventionalMemory`: free RAM once boot services have exited.
    pub const CONVENTIONAL: u32 = 7;

    #[must_use]
    pub const fn is_conventional(&self) -> bool {
        self.typ == Self::CONVENTIONAL
    }

    /// Bytes described by this entry.
    #[must_use]
    pub const fn byte_len(&self) -> u64 {
        self.pages * PAGE_SIZE
    }
}

impl MemoryMapInfo {
    /// Number of descriptors in the map.
    #[must_use]
    pub const fn entries(&self) -> u64 {
        if self.desc_size == 0 {
            0
        } else {
            self.size / self.desc_size
        }
    }

    /// Walk the descriptors.
    ///
    /// # Safety
    /// `ptr` must point to at least `size` readable bytes laid out as
    /// descriptors `desc_size` apart, and stay valid for the iterator's life.
    #[must_use]
    pub unsafe fn descriptors(&self) -> Descriptors<'_> {
        Descriptors {
            info: self,
            index: 0,
        }
    }

    /// Total memory described by the map, in bytes.
    ///
    /// This is the sum of every descriptor's pages regardless of type, i.e.
    /// the extent `[0, total)` that bring-up identity-maps.
    ///
    /// # Safety
    /// Same requirements as [`descriptors`](Self::descriptors).
    #[must_use]
    pub unsafe fn total_bytes(&self) -> u64 {
        unsafe { self.descriptors() }.map(|d| d.byte_len()).sum()
    }
}

/// Iterator returned by [`MemoryMapInfo::descriptors`].
pub struct Descriptors<'a> {
    info: &'a MemoryMapInfo,
    index: u64,
}

impl Iterator for Descriptors<'_> {
    type Item = MemoryDescriptor;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.info.entries() {
            return None;
        }
        let addr = self.info.ptr + self.index * self.info.desc_size;
        self.index += 1;
        // SAFETY: the caller of `descriptors` vouched for the buffer; firmware
        // strides are not guaranteed to keep entries 8-byte aligned.
        Some(unsafe { core::ptr::read_unaligned(addr as *const MemoryDescriptor) })
    }
}
