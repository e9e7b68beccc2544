//! # RSDP/XSDP (Root/Extended System Description Pointer)

use crate::{AcpiError, PhysMapRo, read_u32, read_u64, sum};
use kernel_memory_addresses::PhysicalAddress;

const SIGNATURE: &[u8; 8] = b"RSD PTR ";

/// Bytes covered by the ACPI 1.0 checksum.
const V1_LEN: usize = 20;

/// Size of the ACPI 2.0 structure.
const V2_LEN: usize = 36;

/// Upper bound accepted for the extended structure's declared length.
const MAX_LEN: usize = 4096;

/// Validated root pointers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcpiRoots {
    pub rsdp_addr: PhysicalAddress,
    pub revision: u8,
    pub xsdt_addr: Option<PhysicalAddress>,
    pub rsdt_addr: Option<PhysicalAddress>,
}

// ACPI 1.0 layout (20 bytes):
//   signature[8] checksum u8 oem_id[6] revision u8 rsdt_addr u32
// ACPI 2.0 appends (16 bytes):
//   length u32 xsdt_addr u64 ext_checksum u8 reserved[3]
const REVISION: usize = 15;
const RSDT_ADDR: usize = 16;
const LENGTH: usize = 20;
const XSDT_ADDR: usize = 24;

impl AcpiRoots {
    /// Validate the RSDP/XSDP at `rsdp_addr`.
    ///
    /// Checks the signature and the ACPI 1.0 checksum; for revision 2 and
    /// later also the extended checksum over the declared length.
    ///
    /// # Errors
    /// [`AcpiError::NullRoot`] for a zero address, otherwise a signature,
    /// checksum or length failure.
    ///
    /// # Safety
    /// A non-null `rsdp_addr` must be readable through `map` for the whole
    /// structure.
    pub unsafe fn parse(map: &impl PhysMapRo, rsdp_addr: PhysicalAddress) -> Result<Self, AcpiError> {
        if rsdp_addr.is_null() {
            return Err(AcpiError::NullRoot);
        }

        let v1 = unsafe { map.map_ro(rsdp_addr, V1_LEN) };
        if &v1[0..8] != SIGNATURE {
            return Err(AcpiError::BadRootSignature(rsdp_addr));
        }
        if sum(v1) != 0 {
            return Err(AcpiError::BadRootChecksum(rsdp_addr));
        }

        let revision = v1[REVISION];
        let rsdt = u64::from(read_u32(v1, RSDT_ADDR));
        let rsdt_addr = (rsdt != 0).then(|| PhysicalAddress::new(rsdt));

        if revision < 2 {
            return Ok(Self {
                rsdp_addr,
                revision,
                xsdt_addr: None,
                rsdt_addr,
            });
        }

        // Need full v2 to read length + xsdt
        let v2 = unsafe { map.map_ro(rsdp_addr, V2_LEN) };
        let length = read_u32(v2, LENGTH);
        let len = length as usize;
        if !(V2_LEN..=MAX_LEN).contains(&len) {
            return Err(AcpiError::BadRootLength {
                addr: rsdp_addr,
                length,
            });
        }
        let full = unsafe { map.map_ro(rsdp_addr, len) };
        if sum(full) != 0 {
            return Err(AcpiError::BadRootChecksum(rsdp_addr));
        }

        let xsdt = read_u64(v2, XSDT_ADDR);
        Ok(Self {
            rsdp_addr,
            revision,
            xsdt_addr: (xsdt != 0).then(|| PhysicalAddress::new(xsdt)),
            rsdt_addr,
        })
    }

    /// The XSDT address.
    ///
    /// # Errors
    /// [`AcpiError::NoXsdt`] if the root is ACPI 1.0 or the pointer is null.
    pub const fn xsdt(&self) -> Result<PhysicalAddress, AcpiError> {
        match self.xsdt_addr {
            Some(addr) => Ok(addr),
            None => Err(AcpiError::NoXsdt(self.revision)),
        }
    }
}
