use crate::pic::{PicMasks, PicOffsets};
use kernel_info::memory::{HEAP_BASE, HEAP_INITIAL_PAGES};
use kernel_memory_addresses::VirtualAddress;
use kernel_pci::ProbeStrategy;

/// Compile-time knobs of the bring-up sequence.
///
/// [`Default`] is what the kernel boots with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BringUpConfig {
    /// Virtual base of the kernel heap.
    pub heap_base: VirtualAddress,
    /// Pages mapped for the heap at bring-up.
    pub heap_pages: u64,
    /// Vector bases the PICs are remapped to.
    pub pic_offsets: PicOffsets,
    /// Masks programmed just before interrupts are enabled.
    pub pic_masks: PicMasks,
    pub probe: ProbeStrategy,
}

impl BringUpConfig {
    pub const DEFAULT: Self = Self {
        heap_base: VirtualAddress::new(HEAP_BASE),
        heap_pages: HEAP_INITIAL_PAGES,
        pic_offsets: PicOffsets::LEGACY_REMAP,
        pic_masks: PicMasks::RUNTIME,
        probe: ProbeStrategy::LeadingFunction,
    };
}

impl Default for BringUpConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
