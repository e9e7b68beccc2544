//! # ACPI-driven PCI Discovery
//!
//! ```text
//! RSDP ─null/invalid─▶ warn, stop
//!  │
//! XSDT ─null/invalid─▶ warn, stop
//!  │
//! MCFG ─not found────▶ warn, stop
//!  │
//! ECAM groups ─▶ Enumerator ─▶ report + DriverRegistry::dispatch
//! ```
//!
//! Every stop is a single warning on the diagnostic sink; bring-up then
//! continues with no PCI devices.

use crate::platform::{AddressSpaceManager, Console};
use crate::{DiagnosticSink, MapError};
use alloc::boxed::Box;
use alloc::vec::Vec;
use kernel_acpi::rsdp::AcpiRoots;
use kernel_acpi::{AcpiError, Mcfg, PhysMapRo, Xsdt, mcfg};
use kernel_memory_addresses::PhysicalAddress;
use kernel_pci::names::{self, Named};
use kernel_pci::{
    ConfigSpace, DriverRegistry, EcamGroup, Enumerator, PciDeviceHeader, PciDriver, PciFunction,
    ProbeStrategy,
};
use kernel_serial::SerialLine;

/// Outcome of [`discover_pci`].
pub struct Discovery {
    /// Number of ECAM groups found, or why ACPI discovery stopped.
    pub acpi: Result<usize, AcpiError>,
    /// Every present function in enumeration order.
    pub functions: Vec<PciFunction>,
    /// Drivers constructed for matching functions.
    pub drivers: Vec<Box<dyn PciDriver>>,
    /// Set if a configuration page could not be mapped and the walk ended early.
    pub interrupted: Option<MapError>,
}

impl Discovery {
    const fn unavailable(err: AcpiError) -> Self {
        Self {
            acpi: Err(err),
            functions: Vec::new(),
            drivers: Vec::new(),
            interrupted: None,
        }
    }
}

/// Reads firmware tables through the manager's view of physical memory.
struct Firmware<'m, M>(&'m M);

impl<M: AddressSpaceManager> PhysMapRo for Firmware<'_, M> {
    unsafe fn map_ro<'a>(&self, paddr: PhysicalAddress, len: usize) -> &'a [u8] {
        // SAFETY: ACPI tables sit in memory the firmware map describes, which
        // is identity mapped before discovery runs.
        unsafe { core::slice::from_raw_parts(self.0.phys_to_ptr(paddr), len) }
    }
}

/// ECAM pages, identity-mapped on demand.
struct Ecam<'m, M> {
    memory: &'m mut M,
}

impl<M: AddressSpaceManager> ConfigSpace for Ecam<'_, M> {
    type Error = MapError;

    fn map(&mut self, page: PhysicalAddress) -> Result<(), MapError> {
        self.memory.identity_map(page)?;
        log::trace!("mapped ECAM page {page}");
        Ok(())
    }

    fn read_ids(&mut self, page: PhysicalAddress) -> (u16, u16) {
        let ptr = self.memory.phys_to_ptr(page);
        // SAFETY: the enumerator maps a page before reading it.
        unsafe {
            (
                ptr.cast::<u16>().read_volatile(),
                ptr.add(2).cast::<u16>().read_volatile(),
            )
        }
    }

    fn read_header(&mut self, page: PhysicalAddress) -> PciDeviceHeader {
        // SAFETY: as above; configuration pages are 4 KiB aligned.
        unsafe { self.memory.phys_to_ptr(page).cast::<PciDeviceHeader>().read_volatile() }
    }
}

/// Follow RSDP → XSDT → MCFG to the ECAM groups.
///
/// # Safety
/// Firmware tables must be readable through `memory`.
unsafe fn locate_ecam<M: AddressSpaceManager>(
    memory: &M,
    rsdp: Option<PhysicalAddress>,
) -> Result<Vec<EcamGroup>, AcpiError> {
    let rsdp = rsdp.ok_or(AcpiError::NullRoot)?;
    let fw = Firmware(memory);
    unsafe {
        let roots = AcpiRoots::parse(&fw, rsdp)?;
        let xsdt = Xsdt::parse(&fw, roots.xsdt()?)?;
        let mcfg = Mcfg::parse(&fw, xsdt.find_table(&fw, mcfg::SIGNATURE)?)?;
        Ok(mcfg.entries().map(EcamGroup::from).collect())
    }
}

fn report<S: SerialLine, R: Console>(sink: &mut DiagnosticSink<S, R>, f: &PciFunction) {
    let h = &f.header;
    sink.emit(format_args!(
        "    [PCI Device] {} {} / {}",
        f.address,
        Named {
            name: names::vendor_name(h.vendor_id),
            id: h.vendor_id,
        },
        Named {
            name: names::device_name(h.vendor_id, h.device_id),
            id: h.device_id,
        },
    ));
    sink.emit(format_args!(
        "      - Class: {}",
        Named {
            name: names::class_name(h.class),
            id: h.class,
        }
    ));
    sink.emit(format_args!(
        "      - Subclass: {}",
        Named {
            name: names::subclass_name(h.class, h.subclass),
            id: h.subclass,
        }
    ));
    sink.emit(format_args!(
        "      - ProgIF: {}",
        Named {
            name: names::prog_if_name(h.class, h.subclass, h.prog_if),
            id: h.prog_if,
        }
    ));
}

/// Locate the ECAM regions and enumerate them.
///
/// Never fails: a missing or broken ACPI chain produces one warning and an
/// empty result; a mapping failure mid-walk produces one warning and keeps
/// what was found so far.
///
/// # Safety
/// `rsdp`, if present, must point at firmware tables inside identity-mapped
/// memory.
pub unsafe fn discover_pci<M, S, R>(
    memory: &mut M,
    sink: &mut DiagnosticSink<S, R>,
    rsdp: Option<PhysicalAddress>,
    registry: &DriverRegistry,
    strategy: ProbeStrategy,
) -> Discovery
where
    M: AddressSpaceManager,
    S: SerialLine,
    R: Console,
{
    // SAFETY: forwarded from the caller.
    let groups = match unsafe { locate_ecam(memory, rsdp) } {
        Ok(groups) => groups,
        Err(err) => {
            sink.warn(format_args!("ACPI: {err}; continuing without PCI devices"));
            return Discovery::unavailable(err);
        }
    };
    sink.emit(format_args!("    [ACPI] MCFG lists {} ECAM group(s)", groups.len()));

    let mut discovery = Discovery {
        acpi: Ok(groups.len()),
        functions: Vec::new(),
        drivers: Vec::new(),
        interrupted: None,
    };

    for item in Enumerator::new(Ecam { memory }, &groups, strategy) {
        match item {
            Ok(function) => {
                report(sink, &function);
                if let Some(driver) = registry.dispatch(&function) {
                    sink.emit(format_args!(
                        "      [{}] driver bound to {}",
                        driver.name(),
                        function.address
                    ));
                    discovery.drivers.push(driver);
                }
                discovery.functions.push(function);
            }
            Err(err) => {
                sink.warn(format_args!("PCI: {err}; enumeration stopped"));
                discovery.interrupted = Some(err);
            }
        }
    }

    discovery
}
