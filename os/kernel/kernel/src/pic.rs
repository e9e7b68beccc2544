//! # Legacy 8259 PIC pair

use kernel_bringup::{InterruptController, PicMasks, PicOffsets};
use pic8259::ChainedPics;
use spin::Mutex;

/// The controller pair and the vector bases it was last programmed with.
struct Remapped {
    offsets: PicOffsets,
    pics: ChainedPics,
}

static PICS: Mutex<Remapped> = Mutex::new(Remapped {
    offsets: PicOffsets::LEGACY_REMAP,
    pics: unsafe {
        ChainedPics::new(PicOffsets::LEGACY_REMAP.primary, PicOffsets::LEGACY_REMAP.secondary)
    },
});

pub struct Pic8259(());

impl Pic8259 {
    pub const fn new() -> Self {
        Self(())
    }
}

impl InterruptController for Pic8259 {
    fn remap(&mut self, offsets: PicOffsets) {
        let mut state = PICS.lock();
        state.offsets = offsets;
        // SAFETY: neither offset range overlaps CPU exception vectors.
        unsafe {
            state.pics = ChainedPics::new(offsets.primary, offsets.secondary);
            state.pics.initialize();
            // Every line stays masked until the runtime masks are programmed.
            state
                .pics
                .write_masks(PicMasks::ALL_MASKED.primary, PicMasks::ALL_MASKED.secondary);
        }
    }

    fn set_masks(&mut self, masks: PicMasks) {
        unsafe { PICS.lock().pics.write_masks(masks.primary, masks.secondary) };
    }
}

/// Acknowledge `irq` at the vector it was remapped to.
///
/// Bring-up programs the PICs with interrupts disabled, so the lock is free
/// whenever an IRQ handler runs.
pub fn end_of_interrupt(irq: u8) {
    let mut state = PICS.lock();
    let vector = state.offsets.vector(irq);
    // SAFETY: only called from the handler of `irq`.
    unsafe { state.pics.notify_end_of_interrupt(vector) };
}
