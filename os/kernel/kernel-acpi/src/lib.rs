//! # ACPI Table Discovery
//!
//! Just enough ACPI to find the PCI Express configuration space: validate the
//! firmware's root pointer, walk the extended system table, locate a table by
//! signature and decode the MCFG allocation records.
//!
//! ## Table Chain
//!
//! ```text
//! UEFI configuration table
//!     ↓
//! RSDP/XSDP  "RSD PTR "   (checksum, extended checksum for rev >= 2)
//!     ↓
//! XSDT       "XSDT"       (36-byte header + u64 table pointers, checksum)
//!     ↓ first signature match
//! MCFG       "MCFG"       (44-byte header + 16-byte ECAM records, checksum)
//! ```
//!
//! ## Physical Memory Access
//!
//! Tables live in physical memory. Every read goes through [`PhysMapRo`] so
//! the caller decides how a physical range becomes readable (identity map,
//! direct map, temporary window). Nothing in this crate dereferences a raw
//! address on its own.
//!
//! ## Failure Model
//!
//! Every step returns an [`AcpiError`]. Callers treat these as "no ACPI
//! devices" rather than as fatal: a machine without an MCFG still boots.
//!
//! ## Usage
//! ```rust,no_run
//! use kernel_acpi::{PhysMapRo, mcfg::Mcfg, rsdp::AcpiRoots, xsdt::Xsdt};
//! use kernel_memory_addresses::PhysicalAddress;
//!
//! struct Identity;
//! impl PhysMapRo for Identity {
//!     unsafe fn map_ro<'a>(&self, paddr: PhysicalAddress, len: usize) -> &'a [u8] {
//!         unsafe { core::slice::from_raw_parts(paddr.as_u64() as *const u8, len) }
//!     }
//! }
//!
//! # fn run(rsdp: PhysicalAddress) -> Result<(), kernel_acpi::AcpiError> {
//! let roots = unsafe { AcpiRoots::parse(&Identity, rsdp)? };
//! let xsdt = unsafe { Xsdt::parse(&Identity, roots.xsdt()?)? };
//! let mcfg = unsafe { Mcfg::parse(&Identity, xsdt.find_table(&Identity, *b"MCFG")?)? };
//! for group in mcfg.entries() {
//!     let _ = (group.base_address, group.start_bus, group.end_bus);
//! }
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod error;
pub mod mcfg;
pub mod rsdp;
pub mod sdt;
pub mod xsdt;

pub use error::AcpiError;
pub use mcfg::{Mcfg, McfgEntry};
pub use sdt::{SdtHeader, TableLayout};
pub use xsdt::Xsdt;

use kernel_memory_addresses::PhysicalAddress;

/// Map a physical region and return a *read-only* byte slice for its contents.
/// You provide the implementation (identity map, kmap, etc.).
pub trait PhysMapRo {
    /// # Safety
    /// The implementor must ensure the returned slice is valid for `len` bytes
    /// for as long as the caller uses it.
    unsafe fn map_ro<'a>(&self, paddr: PhysicalAddress, len: usize) -> &'a [u8];
}

fn sum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |a, &b| a.wrapping_add(b))
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(raw)
}

fn read_u64(bytes: &[u8], offset: usize) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[offset..offset + 8]);
    u64::from_le_bytes(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_wraps() {
        assert_eq!(sum(&[0xFF, 0x01]), 0);
        assert_eq!(sum(&[0x80, 0x80, 0x05]), 5);
    }

    #[test]
    fn little_endian_reads() {
        let bytes = [0xAA, 0x78, 0x56, 0x34, 0x12, 0, 0, 0, 0];
        assert_eq!(read_u32(&bytes, 1), 0x1234_5678);
        assert_eq!(read_u64(&bytes, 1), 0x1234_5678);
    }
}
