//! # Address Space Bring-up

use crate::platform::AddressSpaceManager;
use crate::{BringUpError, MapError};
use kernel_info::boot::{BootSnapshot, FramebufferInfo};
use kernel_info::memory::PAGE_SIZE;
use kernel_memory_addresses::{PageRange, PhysicalAddress, Size4K, VirtualAddress};

/// Build and activate the kernel's identity-mapped address space.
///
/// 1. Reserve the kernel image and framebuffer frames.
/// 2. Take a zeroed frame for the top-level table and install it.
/// 3. Identity-map `[0, total)` where `total` is all memory the firmware map
///    describes.
/// 4. Identity-map the framebuffer plus one slack page, skipping pages that
///    step 3 already covered.
/// 5. Activate the table.
///
/// Returns the top-level table's frame.
///
/// # Errors
/// No frame for the top-level table, or a page that could not be mapped.
///
/// # Safety
/// `boot.mmap` must describe a readable UEFI memory map.
pub unsafe fn prepare_memory<M: AddressSpaceManager>(
    memory: &mut M,
    boot: &BootSnapshot,
    kernel_image: PageRange<Size4K>,
) -> Result<PhysicalAddress, BringUpError> {
    let fb = &boot.framebuffer;

    memory.reserve(kernel_image.start(), kernel_image.len());
    memory.reserve(fb.base_address(), fb.reserved_pages());

    let root = memory
        .request_page()
        .ok_or(BringUpError::OutOfFrames("top-level page table"))?;
    // SAFETY: a fresh frame, reachable through the firmware's identity map.
    unsafe { memory.phys_to_ptr(root).write_bytes(0, PAGE_SIZE as usize) };
    memory.install(root);

    // SAFETY: forwarded from the caller.
    let total = unsafe { boot.mmap.total_bytes() };
    let ram = PageRange::<Size4K>::covering(PhysicalAddress::zero(), total);
    log::debug!("identity mapping {} pages of RAM", ram.len());
    for page in ram.iter() {
        identity(memory, page)?;
    }

    for page in fb.mapped_pages().iter().filter(|p| !ram.contains(*p)) {
        identity(memory, page)?;
    }

    memory.activate(root);
    Ok(root)
}

fn identity<M: AddressSpaceManager>(memory: &mut M, page: PhysicalAddress) -> Result<(), BringUpError> {
    let virt = VirtualAddress::new(page.as_u64());
    memory
        .map(virt, page)
        .map_err(|source| BringUpError::Map { virt, source })
}

/// Zero every byte of the framebuffer.
///
/// # Safety
/// The framebuffer must be mapped where `memory` says it is.
pub unsafe fn clear_framebuffer<M: AddressSpaceManager>(memory: &M, fb: &FramebufferInfo) {
    let Ok(len) = usize::try_from(fb.size) else {
        return;
    };
    // SAFETY: forwarded from the caller.
    unsafe { memory.phys_to_ptr(fb.base_address()).write_bytes(0, len) };
}

/// Back `pages` pages at `base` with freshly requested frames.
///
/// For heap implementations; leaves already-mapped pages as they were up to
/// the first failure.
///
/// # Errors
/// Out of frames, or the manager refused a mapping.
pub fn map_fresh_pages<M: AddressSpaceManager>(
    memory: &mut M,
    base: VirtualAddress,
    pages: u64,
) -> Result<(), MapError> {
    if !base.is_aligned::<Size4K>() {
        return Err(MapError::Misaligned(base));
    }
    for i in 0..pages {
        let frame = memory.request_page().ok_or(MapError::OutOfFrames)?;
        memory.map(base + i * PAGE_SIZE, frame)?;
    }
    Ok(())
}
