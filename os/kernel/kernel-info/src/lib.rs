//! # Kernel Boot Handoff and Layout Constants
//!
//! This crate defines the data the bootloader hands to the kernel and the
//! compile-time constants that shape early bring-up.
//!
//! ## Overview
//!
//! ### Boot Snapshot ([`boot`])
//! The bootloader fills a [`BootSnapshot`](boot::BootSnapshot) before jumping
//! to the kernel entry point:
//! * **Framebuffer**: GOP linear framebuffer base, byte size and geometry
//! * **Font**: a PSF1 font handle for the text console
//! * **Memory Map**: the raw UEFI memory map (pointer, byte size, descriptor stride)
//! * **ACPI Root**: the RSDP address, or zero if the firmware did not provide one
//!
//! The snapshot is produced once, borrowed by bring-up, and never mutated.
//!
//! ### Memory Map ([`mmap`])
//! Walks the UEFI descriptor array using the firmware's stride (which may be
//! larger than the structure this crate knows about) and sums the memory it
//! describes.
//!
//! ### Layout ([`memory`])
//! Page size, heap placement, framebuffer slack and the kernel load address.
//!
//! ## Boot Protocol
//!
//! ```text
//! UEFI loader ── BootSnapshot* (RDI, SysV) ──▶ _start_kernel ──▶ bring-up
//! ```
//!
//! All structures are `#[repr(C)]` with fixed-size fields so the loader and the
//! kernel agree on the layout regardless of how either is compiled.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

pub mod boot;
pub mod memory;
pub mod mmap;
