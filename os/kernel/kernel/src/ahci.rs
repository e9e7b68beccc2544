//! AHCI host controller stub: binds to the function and reports its ABAR.

use kernel_memory_addresses::PhysicalAddress;
use kernel_pci::{PciAddress, PciDriver, PciFunction};

/// Offset of BAR5 (ABAR) in a type 0 configuration header.
const BAR5: usize = 0x24;

/// Low BAR bits are flags, not address.
const BAR_FLAGS: u32 = 0xF;

pub struct AhciController {
    address: PciAddress,
}

impl AhciController {
    pub fn bind(function: &PciFunction) -> Self {
        // SAFETY: enumeration mapped the configuration page before yielding it.
        let bar5 = unsafe {
            (function.config.as_u64() as *const u8)
                .add(BAR5)
                .cast::<u32>()
                .read_volatile()
        };
        let abar = PhysicalAddress::new(u64::from(bar5 & !BAR_FLAGS));
        log::info!("AHCI controller at {}: ABAR {abar}", function.address);
        Self {
            address: function.address,
        }
    }
}

impl PciDriver for AhciController {
    fn name(&self) -> &'static str {
        "AHCI"
    }

    fn address(&self) -> PciAddress {
        self.address
    }
}
