use crate::PciDeviceHeader;
use kernel_acpi::McfgEntry;
use kernel_memory_addresses::PhysicalAddress;

/// One ECAM region from the MCFG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EcamGroup {
    pub base: PhysicalAddress,
    pub segment: u16,
    pub start_bus: u8,
    /// Exclusive.
    pub end_bus: u8,
}

impl From<McfgEntry> for EcamGroup {
    fn from(e: McfgEntry) -> Self {
        Self {
            base: e.base_address,
            segment: e.segment_group,
            start_bus: e.start_bus,
            end_bus: e.end_bus,
        }
    }
}

/// Access to configuration pages.
///
/// The enumerator calls [`map`](Self::map) for a page before any read from it.
pub trait ConfigSpace {
    type Error;

    /// Make the 4 KiB configuration page at `page` readable (identity mapped).
    ///
    /// # Errors
    /// Whatever the backing address space reports; enumeration stops.
    fn map(&mut self, page: PhysicalAddress) -> Result<(), Self::Error>;

    /// Vendor and device id of the function at `page`.
    fn read_ids(&mut self, page: PhysicalAddress) -> (u16, u16);

    /// The full header of a function already known to be present.
    fn read_header(&mut self, page: PhysicalAddress) -> PciDeviceHeader;
}

impl<S: ConfigSpace + ?Sized> ConfigSpace for &mut S {
    type Error = S::Error;

    fn map(&mut self, page: PhysicalAddress) -> Result<(), Self::Error> {
        (**self).map(page)
    }

    fn read_ids(&mut self, page: PhysicalAddress) -> (u16, u16) {
        (**self).read_ids(page)
    }

    fn read_header(&mut self, page: PhysicalAddress) -> PciDeviceHeader {
        (**self).read_header(page)
    }
}
