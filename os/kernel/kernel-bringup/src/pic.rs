//! # Legacy 8259 PIC Configuration

use crate::platform::InterruptController;

/// Vector bases for the primary and secondary controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PicOffsets {
    pub primary: u8,
    pub secondary: u8,
}

impl PicOffsets {
    /// Right above the 32 CPU exception vectors.
    pub const LEGACY_REMAP: Self = Self {
        primary: 0x20,
        secondary: 0x28,
    };

    /// Vector of primary line `irq`.
    #[must_use]
    pub const fn vector(&self, irq: u8) -> u8 {
        if irq < 8 {
            self.primary + irq
        } else {
            self.secondary + (irq - 8)
        }
    }
}

pub const IRQ_TIMER: u8 = 0;
pub const IRQ_KEYBOARD: u8 = 1;
pub const IRQ_CASCADE: u8 = 2;
pub const IRQ_MOUSE: u8 = 12;

/// Interrupt masks; a set bit masks the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PicMasks {
    pub primary: u8,
    pub secondary: u8,
}

impl PicMasks {
    /// Timer, keyboard and cascade on the primary; mouse on the secondary.
    pub const RUNTIME: Self = Self {
        primary: 0b1111_1000,
        secondary: 0b1110_1111,
    };

    pub const ALL_MASKED: Self = Self {
        primary: 0xFF,
        secondary: 0xFF,
    };

    /// Whether `irq` is delivered under these masks.
    #[must_use]
    pub const fn is_unmasked(&self, irq: u8) -> bool {
        if irq < 8 {
            self.primary & (1 << irq) == 0
        } else {
            self.secondary & (1 << (irq - 8)) == 0
        }
    }
}

/// Move both controllers to `offsets`; masks are left as they were.
pub fn configure_pic<P: InterruptController>(pic: &mut P, offsets: PicOffsets) {
    pic.remap(offsets);
    log::debug!(
        "PIC remapped to {:#04x}/{:#04x}",
        offsets.primary,
        offsets.secondary
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_masks_open_exactly_four_lines() {
        let open: Vec<u8> = (0..16).filter(|&irq| PicMasks::RUNTIME.is_unmasked(irq)).collect();
        assert_eq!(open, [IRQ_TIMER, IRQ_KEYBOARD, IRQ_CASCADE, IRQ_MOUSE]);
    }

    #[test]
    fn legacy_vectors() {
        let o = PicOffsets::LEGACY_REMAP;
        assert_eq!(o.vector(IRQ_TIMER), 0x20);
        assert_eq!(o.vector(IRQ_KEYBOARD), 0x21);
        assert_eq!(o.vector(IRQ_MOUSE), 0x2C);
    }

    #[test]
    fn vectors_follow_the_programmed_offsets() {
        let o = PicOffsets {
            primary: 0x40,
            secondary: 0x48,
        };
        assert_eq!(o.vector(IRQ_TIMER), 0x40);
        assert_eq!(o.vector(IRQ_KEYBOARD), 0x41);
        assert_eq!(o.vector(IRQ_MOUSE), 0x4C);
    }
}
