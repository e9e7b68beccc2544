//! # PCI Express Memory-mapped Configuration (MCFG)
//!
//! ```text
//! 0   SdtHeader (36)
//! 36  reserved  (8)
//! 44  allocation[0]: base u64 | segment u16 | start_bus u8 | end_bus u8 | reserved u32
//! 60  allocation[1] ...
//! ```

use crate::sdt::TableLayout;
use crate::{AcpiError, PhysMapRo, SdtHeader, read_u64};
use kernel_memory_addresses::PhysicalAddress;

pub const SIGNATURE: [u8; 4] = *b"MCFG";

const HEADER_LEN: usize = SdtHeader::SIZE + 8;
const ENTRY_LEN: usize = 16;

const LAYOUT: TableLayout = TableLayout {
    fixed: HEADER_LEN,
    record: ENTRY_LEN,
    limit: 64 * 1024,
};

/// One ECAM region: the configuration space of a bus range in a segment group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct McfgEntry {
    pub base_address: PhysicalAddress,
    pub segment_group: u16,
    pub start_bus: u8,
    pub end_bus: u8,
}

impl McfgEntry {
    fn from_bytes(raw: &[u8]) -> Self {
        Self {
            base_address: PhysicalAddress::new(read_u64(raw, 0)),
            segment_group: u16::from_le_bytes([raw[8], raw[9]]),
            start_bus: raw[10],
            end_bus: raw[11],
        }
    }
}

pub struct Mcfg<'a> {
    header: SdtHeader,
    records: &'a [u8],
}

impl<'a> Mcfg<'a> {
    /// Read and validate the MCFG at `addr`.
    ///
    /// # Errors
    /// Wrong signature, a length outside the table's bounds, or a bad
    /// checksum.
    ///
    /// # Safety
    /// `addr` must be readable through `map` for the table's declared length.
    pub unsafe fn parse(map: &impl PhysMapRo, addr: PhysicalAddress) -> Result<Self, AcpiError> {
        let (header, table) = unsafe { SdtHeader::read_table(map, addr, SIGNATURE, LAYOUT)? };
        Ok(Self {
            header,
            records: &table[HEADER_LEN..],
        })
    }

    #[must_use]
    pub const fn header(&self) -> &SdtHeader {
        &self.header
    }

    /// Allocation records, in table order.
    pub fn entries(&self) -> impl Iterator<Item = McfgEntry> + '_ {
        self.records
            .chunks_exact(ENTRY_LEN)
            .map(McfgEntry::from_bytes)
    }
}
