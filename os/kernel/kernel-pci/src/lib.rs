//! # PCI Express Enumeration over ECAM
//!
//! Walks memory-mapped configuration space (ECAM) bus by bus, yields every
//! function that is present and hands classified functions to drivers.
//!
//! ## Addressing
//!
//! Each function owns one 4 KiB configuration page:
//!
//! ```text
//! page = group.base + (bus << 20) + (device << 15) + (function << 12)
//!                      0..=255       0..32            0..8
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! MCFG records ─▶ EcamGroup ─▶ Enumerator (lazy) ─▶ PciFunction ─▶ DriverRegistry
//!                                  │                                   │
//!                         ConfigSpace::map/read                 (class, subclass,
//!                                                               prog-if) → ctor
//! ```
//!
//! * [`Enumerator`] only *finds* functions. It is an iterator in
//!   bus → device → function order and maps each page through
//!   [`ConfigSpace`] before reading it.
//! * [`DriverRegistry`] decides what to do with a found function.
//! * [`names`] turns ids into strings for diagnostics.
//!
//! Configuration space is never written.

#![cfg_attr(not(any(test, doctest)), no_std)]

extern crate alloc;

mod address;
mod config;
mod driver;
mod enumerate;
mod header;
pub mod names;

pub use address::PciAddress;
pub use config::{ConfigSpace, EcamGroup};
pub use driver::{DriverRegistry, PciDriver};
pub use enumerate::{Enumerator, PciFunction, ProbeStrategy};
pub use header::{ClassTriple, PciDeviceHeader};
