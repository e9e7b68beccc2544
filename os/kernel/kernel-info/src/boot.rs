//! # Boot Snapshot

use crate::memory::{FRAMEBUFFER_SLACK_PAGES, PAGE_SIZE};
use crate::mmap::MemoryMapInfo;
use kernel_memory_addresses::{PageRange, PhysicalAddress, Size4K, pages_for};

/// Everything the kernel learns from the bootloader.
///
/// Keep this `#[repr(C)]` and prefer fixed-size integers at the ABI boundary.
#[repr(C)]
#[derive(Clone, Debug)]
pub struct BootSnapshot {
    /// Linear framebuffer from UEFI GOP.
    pub framebuffer: FramebufferInfo,

    /// PSF1 font used by the text console.
    pub font: Psf1Font,

    /// Raw UEFI memory map.
    pub mmap: MemoryMapInfo,

    /// RSDP physical address, or 0 if not provided.
    pub rsdp_addr: u64,
}

impl BootSnapshot {
    /// The ACPI root pointer, if the firmware supplied one.
    #[must_use]
    pub const fn rsdp(&self) -> Option<PhysicalAddress> {
        if self.rsdp_addr == 0 {
            None
        } else {
            Some(PhysicalAddress::new(self.rsdp_addr))
        }
    }
}

#[repr(C)]
#[derive(Clone, Debug)]
pub struct FramebufferInfo {
    /// Linear framebuffer base address (CPU physical address).
    pub base: u64,

    /// Total framebuffer size in **bytes** as reported by GOP.
    pub size: u64,

    /// Visible width in **pixels**.
    pub width: u32,

    /// Visible height in **pixels**.
    pub height: u32,

    /// Pixels per scanline (a.k.a. stride). May be >= width due to padding.
    pub pixels_per_scanline: u32,
}

impl FramebufferInfo {
    #[must_use]
    pub const fn base_address(&self) -> PhysicalAddress {
        PhysicalAddress::new(self.base)
    }

    /// Bytes mapped for the framebuffer: the reported size plus the slack page.
    #[must_use]
    pub const fn mapped_bytes(&self) -> u64 {
        self.size + FRAMEBUFFER_SLACK_PAGES * PAGE_SIZE
    }

    /// Pages identity-mapped for the framebuffer, starting at its base page.
    #[must_use]
    pub const fn mapped_pages(&self) -> PageRange<Size4K> {
        PageRange::covering(self.base_address(), self.mapped_bytes())
    }

    /// Frames withheld from the frame allocator for the framebuffer.
    #[must_use]
    pub const fn reserved_pages(&self) -> u64 {
        self.size / PAGE_SIZE + 1
    }

    /// Number of 4 KiB pages spanned by the buffer proper.
    #[must_use]
    pub const fn page_count(&self) -> u64 {
        pages_for::<Size4K>(self.size)
    }
}

/// Handle to a PSF1 font loaded by the bootloader.
#[repr(C)]
#[derive(Clone, Debug)]
pub struct Psf1Font {
    /// Address of the [`Psf1Header`].
    pub header: u64,

    /// Address of the glyph bitmaps; `char_size` bytes per glyph.
    pub glyphs: u64,
}

/// On-disk PSF1 header.
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct Psf1Header {
    pub magic: [u8; 2],
    pub mode: u8,
    /// Bytes per glyph; glyphs are 8 pixels wide, so this is also the height.
    pub char_size: u8,
}

impl Psf1Header {
    pub const MAGIC: [u8; 2] = [0x36, 0x04];

    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.magic[0] == Self::MAGIC[0] && self.magic[1] == Self::MAGIC[1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fb(base: u64, size: u64) -> FramebufferInfo {
        FramebufferInfo {
            base,
            size,
            width: 0,
            height: 0,
            pixels_per_scanline: 0,
        }
    }

    #[test]
    fn framebuffer_mapping_includes_slack_page() {
        let info = fb(0x8000_0000, 0x1D_4C00);
        let pages = info.mapped_pages();
        assert_eq!(pages.start().as_u64(), 0x8000_0000);
        assert_eq!(pages.len(), 0x1D5 + 1);
    }

    #[test]
    fn exact_page_multiple_still_gets_one_slack_page() {
        let info = fb(0x8000_0000, 3 * PAGE_SIZE);
        assert_eq!(info.mapped_pages().len(), 4);
        assert_eq!(info.reserved_pages(), 4);
        assert_eq!(info.page_count(), 3);
    }

    #[test]
    fn partial_page_counts_as_a_page() {
        assert_eq!(fb(0, 1).page_count(), 1);
        assert_eq!(fb(0, PAGE_SIZE + 1).page_count(), 2);
        assert_eq!(fb(0, 0).page_count(), 0);
    }

    #[test]
    fn rsdp_zero_means_absent() {
        let mut snapshot = BootSnapshot {
            framebuffer: fb(0, 0),
            font: Psf1Font { header: 0, glyphs: 0 },
            mmap: MemoryMapInfo {
                ptr: 0,
                size: 0,
                desc_size: 0,
            },
            rsdp_addr: 0,
        };
        assert_eq!(snapshot.rsdp(), None);
        snapshot.rsdp_addr = 0xE_0000;
        assert_eq!(snapshot.rsdp(), Some(PhysicalAddress::new(0xE_0000)));
    }
}
