//! # System Description Table Header

use crate::{AcpiError, PhysMapRo, read_u32, sum};
use kernel_memory_addresses::PhysicalAddress;

/// The 36-byte header shared by every ACPI system description table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SdtHeader {
    pub signature: [u8; 4],
    /// Length of the whole table including this header.
    pub length: u32,
    pub revision: u8,
    pub checksum: u8,
    pub oem_id: [u8; 6],
    pub oem_table_id: [u8; 8],
    pub oem_revision: u32,
    pub creator_id: u32,
    pub creator_revision: u32,
}

impl SdtHeader {
    pub const SIZE: usize = 36;

    /// Decode a header from the first [`SIZE`](Self::SIZE) bytes of `bytes`.
    ///
    /// # Panics
    /// If `bytes` is shorter than a header.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut signature = [0; 4];
        signature.copy_from_slice(&bytes[0..4]);
        let mut oem_id = [0; 6];
        oem_id.copy_from_slice(&bytes[10..16]);
        let mut oem_table_id = [0; 8];
        oem_table_id.copy_from_slice(&bytes[16..24]);
        Self {
            signature,
            length: read_u32(bytes, 4),
            revision: bytes[8],
            checksum: bytes[9],
            oem_id,
            oem_table_id,
            oem_revision: read_u32(bytes, 24),
            creator_id: read_u32(bytes, 28),
            creator_revision: read_u32(bytes, 32),
        }
    }

    /// Read the header of the table at `addr`.
    ///
    /// # Safety
    /// `addr` must be readable through `map` for [`SIZE`](Self::SIZE) bytes.
    #[must_use]
    pub unsafe fn read(map: &impl PhysMapRo, addr: PhysicalAddress) -> Self {
        let bytes = unsafe { map.map_ro(addr, Self::SIZE) };
        Self::from_bytes(bytes)
    }

    /// Read the table at `addr` and return its header and full contents.
    ///
    /// The declared length is checked against `layout` before the table is
    /// mapped in full and its checksum verified.
    ///
    /// # Errors
    /// Signature mismatch, a length outside those bounds, or a bad checksum.
    ///
    /// # Safety
    /// `addr` must be readable through `map` for its declared length, up to
    /// `layout.limit` bytes.
    pub unsafe fn read_table<'a>(
        map: &impl PhysMapRo,
        addr: PhysicalAddress,
        signature: [u8; 4],
        layout: TableLayout,
    ) -> Result<(Self, &'a [u8]), AcpiError> {
        let header = unsafe { Self::read(map, addr) };
        if header.signature != signature {
            return Err(AcpiError::UnexpectedSignature {
                addr,
                expected: signature,
                found: header.signature,
            });
        }

        let length = header.length as usize;
        if length < layout.fixed {
            return Err(AcpiError::Truncated {
                addr,
                length: header.length,
            });
        }
        if length > layout.limit {
            return Err(AcpiError::Oversized {
                addr,
                length: header.length,
                limit: layout.limit,
            });
        }
        if !(length - layout.fixed).is_multiple_of(layout.record) {
            return Err(AcpiError::RaggedLength {
                addr,
                length: header.length,
                record: layout.record,
            });
        }

        let table: &'a [u8] = unsafe { map.map_ro(addr, length) };
        if sum(table) != 0 {
            return Err(AcpiError::BadTableChecksum(addr));
        }
        Ok((header, table))
    }

    /// Signature as text, for logs.
    #[must_use]
    pub fn signature_str(&self) -> &str {
        core::str::from_utf8(&self.signature).unwrap_or("????")
    }
}

/// Shape of a table: fixed part, trailing record size and an upper bound on
/// the declared length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableLayout {
    pub fixed: usize,
    pub record: usize,
    pub limit: usize,
}
