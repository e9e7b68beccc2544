use core::fmt;

/// Class code triple used to pick a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassTriple {
    pub class: u8,
    pub subclass: u8,
    pub prog_if: u8,
}

impl ClassTriple {
    /// Mass storage / Serial ATA / AHCI 1.0.
    pub const AHCI: Self = Self::new(0x01, 0x06, 0x01);

    #[must_use]
    pub const fn new(class: u8, subclass: u8, prog_if: u8) -> Self {
        Self {
            class,
            subclass,
            prog_if,
        }
    }
}

impl fmt::Display for ClassTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}/{:02x}/{:02x}", self.class, self.subclass, self.prog_if)
    }
}

/// The common first 16 bytes of every function's configuration space.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PciDeviceHeader {
    pub vendor_id: u16,
    pub device_id: u16,
    pub command: u16,
    pub status: u16,
    pub revision_id: u8,
    pub prog_if: u8,
    pub subclass: u8,
    pub class: u8,
    pub cache_line_size: u8,
    pub latency_timer: u8,
    pub header_type: u8,
    pub bist: u8,
}

const _: () = assert!(size_of::<PciDeviceHeader>() == 16);

impl PciDeviceHeader {
    /// What an unclaimed configuration read returns.
    pub const ABSENT: Self = Self::new(0xFFFF, 0xFFFF, ClassTriple::new(0xFF, 0xFF, 0xFF));

    #[must_use]
    pub const fn new(vendor_id: u16, device_id: u16, class: ClassTriple) -> Self {
        Self {
            vendor_id,
            device_id,
            command: 0,
            status: 0,
            revision_id: 0,
            prog_if: class.prog_if,
            subclass: class.subclass,
            class: class.class,
            cache_line_size: 0,
            latency_timer: 0,
            header_type: 0,
            bist: 0,
        }
    }

    /// Whether a function answers at this address.
    ///
    /// A vendor of `0xFFFF` or a device id of `0` or `0xFFFF` means nothing is
    /// there and no other field may be trusted.
    #[must_use]
    pub const fn is_present(&self) -> bool {
        ids_present(self.vendor_id, self.device_id)
    }

    #[must_use]
    pub const fn class_triple(&self) -> ClassTriple {
        ClassTriple::new(self.class, self.subclass, self.prog_if)
    }
}

pub(crate) const fn ids_present(vendor_id: u16, device_id: u16) -> bool {
    vendor_id != 0xFFFF && device_id != 0 && device_id != 0xFFFF
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presence() {
        let ahci = PciDeviceHeader::new(0x8086, 0x2922, ClassTriple::AHCI);
        assert!(ahci.is_present());
        assert!(!PciDeviceHeader::ABSENT.is_present());
        assert!(!PciDeviceHeader::new(0xFFFF, 0x1234, ClassTriple::AHCI).is_present());
        assert!(!PciDeviceHeader::new(0x8086, 0, ClassTriple::AHCI).is_present());
    }

    #[test]
    fn class_fields_land_in_the_right_bytes() {
        let h = PciDeviceHeader::new(0x8086, 0x2922, ClassTriple::AHCI);
        // Offsets 0x09..0x0B: prog-if, subclass, class.
        let raw: [u8; 16] = unsafe { core::mem::transmute(h) };
        assert_eq!(&raw[9..12], &[0x01, 0x06, 0x01]);
        assert_eq!(h.class_triple(), ClassTriple::AHCI);
    }
}
