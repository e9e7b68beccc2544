//! # Physical and Virtual Memory Address Types
//!
//! Strongly typed wrappers for raw memory addresses used while bringing up the
//! kernel's address space.
//!
//! ## Overview
//!
//! The bring-up code juggles three kinds of numbers that all look like `u64`:
//! firmware-reported **physical** addresses (RAM, framebuffer, ACPI tables,
//! PCI configuration space), **virtual** addresses the CPU can dereference once
//! a mapping exists, and plain byte counts. Mixing them up is the classic way
//! to touch memory before it is mapped. This crate gives each its own type:
//!
//! | Type | Meaning |
//! |------|---------|
//! | [`PhysicalAddress`] | Physical memory or MMIO. Never dereferenced directly. |
//! | [`VirtualAddress`] | Page-table translated address; the only kind that yields pointers. |
//! | [`PageRange<S>`] | A run of whole pages of size `S`, iterated page by page. |
//!
//! There is no `From<PhysicalAddress> for VirtualAddress`. The
//! address-space manager's mapping operation is the place where one becomes
//! the other.
//!
//! ## Typical Usage
//!
//! ```rust
//! # use kernel_memory_addresses::*;
//! let fb = PhysicalAddress::new(0x8000_0123);
//! assert_eq!(fb.align_down::<Size4K>().as_u64(), 0x8000_0000);
//! assert_eq!(fb.page_offset::<Size4K>(), 0x123);
//!
//! // A 5000-byte buffer starting mid-page spans two pages.
//! let range = PageRange::<Size4K>::covering(fb, 5000);
//! assert_eq!(range.len(), 2);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(clippy::inline_always)]

mod page_range;
mod page_size;
mod physical_address;
mod virtual_address;

pub use page_range::{PageIter, PageRange};
pub use page_size::{PageSize, Size4K};
pub use physical_address::PhysicalAddress;
pub use virtual_address::VirtualAddress;

/// Number of `S`-sized pages needed to hold `len` bytes (rounded up).
///
/// ```rust
/// # use kernel_memory_addresses::*;
/// assert_eq!(pages_for::<Size4K>(0), 0);
/// assert_eq!(pages_for::<Size4K>(1), 1);
/// assert_eq!(pages_for::<Size4K>(4096), 1);
/// assert_eq!(pages_for::<Size4K>(4097), 2);
/// ```
#[inline]
#[must_use]
pub const fn pages_for<S: PageSize>(len: u64) -> u64 {
    len.div_ceil(S::SIZE)
}
