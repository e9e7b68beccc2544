//! # Kernel Bring-up
//!
//! Takes the machine from "interrupts off, firmware page tables, no heap" to
//! "interrupts on, identity-mapped address space, PCI devices enumerated".
//!
//! ## Sequence
//!
//! [`bring_up`] runs eleven steps exactly once, in this order:
//!
//! | # | Step | Notes |
//! |---|------|-------|
//! | 1 | mask interrupts | `cli` |
//! | 2 | diagnostics | COM1 programmed; every later line is mirrored to serial |
//! | 3 | GDT | flat code/data segments |
//! | 4 | paging | reserve kernel + framebuffer, identity map RAM + framebuffer, activate |
//! | 5 | framebuffer | zeroed through the new mapping |
//! | 6 | heap | allocator backed by fresh frames at a fixed virtual base |
//! | 7 | interrupts | six gates installed, table loaded, PIC remapped |
//! | 8 | input | PS/2 devices |
//! | 9 | ACPI / PCI | non-fatal; degrades to zero devices |
//! | 10 | PIC masks | timer, keyboard, cascade and mouse unmasked |
//! | 11 | enable interrupts | `sti` |
//!
//! Every step prints a progress line before it runs, so the last line on the
//! screen or serial console names the step that hung.
//!
//! ## Collaborators
//!
//! Hardware-specific work sits behind the traits in [`platform`]. The kernel
//! binary implements them over the real CPU, page tables and devices; tests
//! implement them as recorders. A [`Platform`] names one concrete set and a
//! [`Machine`] carries the instances into [`bring_up`].
//!
//! ## Failure
//!
//! * ACPI and PCI problems are warnings. Bring-up continues with no devices.
//! * Anything else ([`BringUpError`]) goes to [`panic::halt`]: red screen,
//!   banner, message, `hlt` forever.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

extern crate alloc;

mod config;
mod diagnostics;
pub mod discovery;
mod error;
pub mod gates;
pub mod memory;
pub mod panic;
pub mod pic;
pub mod platform;
mod sequence;

pub use config::BringUpConfig;
pub use diagnostics::DiagnosticSink;
pub use discovery::{Discovery, discover_pci};
pub use error::{BringUpError, HeapError, MapError};
pub use gates::{DescriptorTablePointer, GateHandlers, InterruptGateTable, install_gates};
pub use memory::{clear_framebuffer, prepare_memory};
pub use pic::{PicMasks, PicOffsets, configure_pic};
pub use platform::{
    AddressSpaceManager, Console, Cpu, HeapAllocator, InputDevices, InterruptController, Machine,
    Platform,
};
pub use sequence::{BringUpStep, KernelContext, bring_up};
