//! # Physical Frame Bitmap
//!
//! One bit per 4 KiB frame of everything the firmware map describes; a set
//! bit means the frame is in use. The bitmap itself lives at the start of the
//! largest conventional region and is marked used like any other allocation.
//!
//! ```text
//! largest EfiConventionalMemory region
//! ┌────────────┬───────────────────────────────┐
//! │  bitmap    │  free frames ...              │
//! └────────────┴───────────────────────────────┘
//! ```

use kernel_info::memory::PAGE_SIZE;
use kernel_info::mmap::{MemoryDescriptor, MemoryMapInfo};
use kernel_memory_addresses::{PhysicalAddress, Size4K};

pub struct FrameBitmap {
    bits: &'static mut [u8],
    /// Frames tracked; trailing bits of the last byte are unused.
    frames: usize,
    /// Index to start the next free-frame search at.
    next: usize,
    free: u64,
    used: u64,
    reserved: u64,
}

impl FrameBitmap {
    /// Build the bitmap from the firmware memory map.
    ///
    /// Returns `None` if the map lists no conventional memory large enough to
    /// hold the bitmap.
    ///
    /// # Safety
    /// The map must be readable and its conventional regions unused and
    /// reachable at their physical addresses. Call once.
    pub unsafe fn from_memory_map(mmap: &MemoryMapInfo) -> Option<Self> {
        let total = unsafe { mmap.total_bytes() };
        let frames = total / PAGE_SIZE;
        let len = usize::try_from(frames.div_ceil(8)).ok()?;

        let largest = unsafe { mmap.descriptors() }
            .filter(MemoryDescriptor::is_conventional)
            .max_by_key(|d| d.pages)?;
        if largest.byte_len() < len as u64 {
            return None;
        }

        // SAFETY: the region is free RAM the caller vouched for.
        let bits = unsafe {
            let ptr = largest.phys_start as *mut u8;
            ptr.write_bytes(0, len);
            core::slice::from_raw_parts_mut(ptr, len)
        };

        let mut bitmap = Self {
            bits,
            frames: usize::try_from(frames).ok()?,
            next: 0,
            free: total,
            used: 0,
            reserved: 0,
        };

        for d in unsafe { mmap.descriptors() }.filter(|d| !d.is_conventional()) {
            bitmap.reserve(PhysicalAddress::new(d.phys_start), d.pages);
        }
        bitmap.lock(PhysicalAddress::new(largest.phys_start), (len as u64).div_ceil(PAGE_SIZE));
        // Frame 0 doubles as the null address.
        bitmap.reserve(PhysicalAddress::zero(), 1);

        log::info!(
            "frame bitmap: {frames} frames, {} KiB free",
            bitmap.free_bytes() / 1024
        );
        Some(bitmap)
    }

    #[allow(clippy::cast_possible_truncation)]
    const fn index(frame: PhysicalAddress) -> usize {
        (frame.as_u64() / PAGE_SIZE) as usize
    }

    fn get(&self, index: usize) -> Option<bool> {
        let byte = self.bits.get(index / 8)?;
        Some(byte & (0x80 >> (index % 8)) != 0)
    }

    /// Flip the bit at `index` to `used`; false if it already was or is out of range.
    fn set(&mut self, index: usize, used: bool) -> bool {
        if index >= self.frames {
            return false;
        }
        let Some(byte) = self.bits.get_mut(index / 8) else {
            return false;
        };
        let mask = 0x80 >> (index % 8);
        if (*byte & mask != 0) == used {
            return false;
        }
        if used {
            *byte |= mask;
        } else {
            *byte &= !mask;
        }
        true
    }

    fn for_each_frame(&mut self, base: PhysicalAddress, pages: u64, mut f: impl FnMut(&mut Self, usize)) {
        let first = Self::index(base.align_down::<Size4K>());
        let Ok(pages) = usize::try_from(pages) else {
            return;
        };
        for index in first..first.saturating_add(pages) {
            f(self, index);
        }
    }

    /// Mark frames as allocated.
    pub fn lock(&mut self, base: PhysicalAddress, pages: u64) {
        self.for_each_frame(base, pages, |b, i| {
            if b.set(i, true) {
                b.free -= PAGE_SIZE;
                b.used += PAGE_SIZE;
            }
        });
    }

    /// Withhold frames permanently.
    pub fn reserve(&mut self, base: PhysicalAddress, pages: u64) {
        self.for_each_frame(base, pages, |b, i| {
            if b.set(i, true) {
                b.free -= PAGE_SIZE;
                b.reserved += PAGE_SIZE;
            }
        });
    }

    /// Hand out the lowest free frame.
    pub fn request(&mut self) -> Option<PhysicalAddress> {
        let index = (self.next..self.frames).find(|&i| self.get(i) == Some(false))?;
        self.set(index, true);
        self.free -= PAGE_SIZE;
        self.used += PAGE_SIZE;
        self.next = index + 1;
        Some(PhysicalAddress::new(index as u64 * PAGE_SIZE))
    }

    pub const fn free_bytes(&self) -> u64 {
        self.free
    }

    pub const fn used_bytes(&self) -> u64 {
        self.used
    }

    pub const fn reserved_bytes(&self) -> u64 {
        self.reserved
    }
}
