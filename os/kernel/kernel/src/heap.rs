//! # Kernel Heap
//!
//! A `linked_list_allocator` heap over freshly mapped pages at
//! [`HEAP_BASE`](kernel_info::memory::HEAP_BASE). Nothing allocates before
//! bring-up step 6 has run [`KernelHeap::init`].

use crate::paging::KernelMemory;
use kernel_bringup::memory::map_fresh_pages;
use kernel_bringup::{HeapAllocator, HeapError};
use kernel_info::memory::PAGE_SIZE;
use kernel_memory_addresses::{Size4K, VirtualAddress};
use linked_list_allocator::LockedHeap;

#[global_allocator]
static ALLOCATOR: LockedHeap = LockedHeap::empty();

pub struct KernelHeap(());

impl KernelHeap {
    pub const fn new() -> Self {
        Self(())
    }

    /// `(size, used)` in bytes.
    pub fn usage(&self) -> (usize, usize) {
        let heap = ALLOCATOR.lock();
        (heap.size(), heap.used())
    }
}

impl HeapAllocator<KernelMemory> for KernelHeap {
    #[allow(clippy::cast_possible_truncation)]
    fn init(
        &mut self,
        memory: &mut KernelMemory,
        base: VirtualAddress,
        pages: u64,
    ) -> Result<(), HeapError> {
        if pages == 0 {
            return Err(HeapError::Empty);
        }
        if !base.is_aligned::<Size4K>() {
            return Err(HeapError::Misaligned(base));
        }

        map_fresh_pages(memory, base, pages)?;

        let size = (pages * PAGE_SIZE) as usize;
        // SAFETY: the range was just mapped and is used by nothing else.
        unsafe { ALLOCATOR.lock().init(base.as_mut_ptr(), size) };
        log::info!("heap: {size} bytes at {base}");
        Ok(())
    }
}
