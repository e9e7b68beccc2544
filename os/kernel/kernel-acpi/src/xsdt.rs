//! # Extended System Description Table

use crate::sdt::TableLayout;
use crate::{AcpiError, PhysMapRo, SdtHeader, read_u64};
use kernel_memory_addresses::PhysicalAddress;

pub const SIGNATURE: [u8; 4] = *b"XSDT";

/// 8-byte pointers after the header, at most 64 KiB in total.
const LAYOUT: TableLayout = TableLayout {
    fixed: SdtHeader::SIZE,
    record: 8,
    limit: 64 * 1024,
};

/// A validated XSDT: header plus its array of 64-bit table pointers.
pub struct Xsdt<'a> {
    addr: PhysicalAddress,
    header: SdtHeader,
    pointers: &'a [u8],
}

impl<'a> Xsdt<'a> {
    /// Read and validate the XSDT at `addr`.
    ///
    /// # Errors
    /// Wrong signature, a length that is too short, too long or not a whole
    /// number of pointers, or a bad checksum.
    ///
    /// # Safety
    /// `addr` must be readable through `map` for the table's declared length.
    pub unsafe fn parse(map: &impl PhysMapRo, addr: PhysicalAddress) -> Result<Self, AcpiError> {
        let (header, table) = unsafe { SdtHeader::read_table(map, addr, SIGNATURE, LAYOUT)? };
        Ok(Self {
            addr,
            header,
            pointers: &table[SdtHeader::SIZE..],
        })
    }

    #[must_use]
    pub const fn address(&self) -> PhysicalAddress {
        self.addr
    }

    #[must_use]
    pub const fn header(&self) -> &SdtHeader {
        &self.header
    }

    /// Number of table pointers.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.pointers.len() / 8
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The sub-table pointers, in table order.
    pub fn entries(&self) -> impl Iterator<Item = PhysicalAddress> + '_ {
        (0..self.len()).map(|i| PhysicalAddress::new(read_u64(self.pointers, i * 8)))
    }

    /// Linear search for the first table whose signature is `signature`.
    ///
    /// Null pointers in the array are skipped.
    ///
    /// # Errors
    /// [`AcpiError::TableNotFound`] if no entry matches.
    ///
    /// # Safety
    /// Every non-null entry must point at a readable table header.
    pub unsafe fn find_table(
        &self,
        map: &impl PhysMapRo,
        signature: [u8; 4],
    ) -> Result<PhysicalAddress, AcpiError> {
        for entry in self.entries().filter(|e| !e.is_null()) {
            let header = unsafe { SdtHeader::read(map, entry) };
            log::trace!("XSDT entry {entry}: {}", header.signature_str());
            if header.signature == signature {
                return Ok(entry);
            }
        }
        Err(AcpiError::TableNotFound(signature))
    }
}
