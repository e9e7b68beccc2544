mod common;

use common::{Event, Firmware, Harness, header};
use kernel_acpi::AcpiError;
use kernel_bringup::{BringUpConfig, Machine, discover_pci, bring_up};
use kernel_memory_addresses::PhysicalAddress;
use kernel_pci::{ClassTriple, DriverRegistry, PciAddress, ProbeStrategy};

const HOST_BRIDGE: ClassTriple = ClassTriple::new(0x06, 0x00, 0x00);
const ISA_BRIDGE: ClassTriple = ClassTriple::new(0x06, 0x01, 0x00);
const IDE: ClassTriple = ClassTriple::new(0x01, 0x01, 0x80);

fn q35_like(fw: &mut Firmware) -> u64 {
    let ecam = fw.ecam(&[
        (0x00, 0, header(0x8086, 0x29C0, HOST_BRIDGE)),
        (0x03, 0, header(0x8086, 0x7010, IDE)),
        (0x1F, 0, header(0x8086, 0x2918, ISA_BRIDGE)),
        (0x1F, 2, header(0x8086, 0x2922, ClassTriple::AHCI)),
    ]);
    fw.acpi_with_mcfg(ecam)
}

fn registry() -> DriverRegistry {
    let mut registry = DriverRegistry::new();
    registry.register(ClassTriple::AHCI, <common::Mock as kernel_bringup::Platform>::ahci_driver);
    registry
}

/// Run discovery alone against `rsdp`, returning it with the warning count.
fn discover(h: &Harness, rsdp: u64) -> (kernel_bringup::Discovery, usize) {
    let Machine {
        mut memory,
        mut sink,
        ..
    } = h.machine();
    sink.init();
    let rsdp = (rsdp != 0).then(|| PhysicalAddress::new(rsdp));
    let found = unsafe {
        discover_pci(
            &mut memory,
            &mut sink,
            rsdp,
            &registry(),
            ProbeStrategy::LeadingFunction,
        )
    };
    (found, sink.warnings())
}

fn maps(h: &Harness) -> usize {
    h.events()
        .iter()
        .filter(|e| matches!(e, Event::Map { .. }))
        .count()
}

#[test]
fn null_rsdp_warns_once_and_touches_nothing() {
    let h = Harness::new();
    let (found, warnings) = discover(&h, 0);

    assert_eq!(warnings, 1);
    assert_eq!(found.acpi.unwrap_err(), AcpiError::NullRoot);
    assert!(found.functions.is_empty());
    assert!(found.drivers.is_empty());
    assert_eq!(maps(&h), 0);
    assert!(h.console.borrow().contains("[!] "));
}

#[test]
fn null_rsdp_still_completes_bring_up() {
    let h = Harness::new();
    let ctx = unsafe { bring_up(h.machine(), &h.boot, &BringUpConfig::default()) };
    let events = h.events();

    assert_eq!(ctx.sink.warnings(), 1);
    assert!(ctx.pci.functions.is_empty());
    assert_eq!(events.last(), Some(&Event::EnableInterrupts));

    // Nothing is mapped between the input step and the final masks.
    let input = events.iter().position(|e| *e == Event::InputInit).unwrap();
    let masks = events
        .iter()
        .position(|e| matches!(e, Event::Masks(_)))
        .unwrap();
    assert!(
        !events[input..masks]
            .iter()
            .any(|e| matches!(e, Event::Map { .. }))
    );
}

#[test]
fn corrupt_rsdp_is_a_single_warning() {
    let h = Harness::new();
    let garbage = [0u8; 36];
    let (found, warnings) = discover(&h, garbage.as_ptr() as u64);

    assert_eq!(warnings, 1);
    assert!(matches!(found.acpi, Err(AcpiError::BadRootSignature(_))));
    assert_eq!(maps(&h), 0);
}

#[test]
fn oversized_xsdt_is_a_single_warning() {
    let h = Harness::new();
    let mut fw = Firmware::default();
    let rsdp = fw.acpi_with_xsdt_length(0x7FFF_FFFF);

    let (found, warnings) = discover(&h, rsdp);
    assert_eq!(warnings, 1);
    assert!(matches!(found.acpi, Err(AcpiError::Oversized { length: 0x7FFF_FFFF, .. })));
    assert!(found.functions.is_empty());
    assert_eq!(maps(&h), 0);
}

#[test]
fn missing_mcfg_is_a_single_warning() {
    let h = Harness::new();
    let mut fw = Firmware::default();
    let facp = fw.table(b"FACP");
    let apic = fw.table(b"APIC");
    let rsdp = fw.acpi_with_tables(&[facp, apic]);

    let (found, warnings) = discover(&h, rsdp);
    assert_eq!(warnings, 1);
    assert_eq!(found.acpi.unwrap_err(), AcpiError::TableNotFound(*b"MCFG"));
    assert!(found.functions.is_empty());
}

#[test]
fn functions_are_reported_in_address_order() {
    let h = Harness::new();
    let mut fw = Firmware::default();
    let rsdp = q35_like(&mut fw);

    let (found, warnings) = discover(&h, rsdp);
    assert_eq!(warnings, 0);
    assert_eq!(found.acpi, Ok(1));
    let addresses: Vec<String> = found
        .functions
        .iter()
        .map(|f| f.address.to_string())
        .collect();
    assert_eq!(
        addresses,
        ["0000:00:00.0", "0000:00:03.0", "0000:00:1f.0", "0000:00:1f.2"]
    );

    let console = h.console.borrow();
    assert!(console.contains("[ACPI] MCFG lists 1 ECAM group(s)"));
    assert!(console.contains("Mass Storage Controller"));
    assert!(console.contains("0000:00:1f.2"));
}

#[test]
fn ecam_pages_are_mapped_before_they_are_read() {
    let h = Harness::new();
    let mut fw = Firmware::default();
    let rsdp = q35_like(&mut fw);

    let (found, _) = discover(&h, rsdp);
    let mapped: Vec<u64> = h
        .events()
        .iter()
        .filter_map(|e| match e {
            Event::Map { virt, .. } => Some(*virt),
            _ => None,
        })
        .collect();
    for f in &found.functions {
        assert!(mapped.contains(&f.config.as_u64()), "{}", f.address);
    }
}

#[test]
fn one_ahci_function_builds_one_driver() {
    let mut h = Harness::new();
    let mut fw = Firmware::default();
    h.boot.rsdp_addr = q35_like(&mut fw);

    let ctx = unsafe { bring_up(h.machine(), &h.boot, &BringUpConfig::default()) };

    assert_eq!(ctx.sink.warnings(), 0);
    assert_eq!(ctx.pci.functions.len(), 4);
    assert_eq!(ctx.pci.drivers.len(), 1);
    let driver = &ctx.pci.drivers[0];
    assert_eq!(driver.name(), "AHCI");
    assert_eq!(driver.address(), PciAddress::new(0, 0, 0x1F, 2));
    assert!(
        h.console
            .borrow()
            .contains("[AHCI] driver bound to 0000:00:1f.2")
    );
    assert_eq!(h.events().last(), Some(&Event::EnableInterrupts));
}

#[test]
fn map_failure_keeps_functions_found_so_far() {
    let mut h = Harness::new();
    let mut fw = Firmware::default();
    let rsdp = q35_like(&mut fw);
    // Fail on device 3's configuration page.
    let ecam_base = {
        let (found, _) = discover(&Harness::new(), rsdp);
        found.functions[0].config.as_u64()
    };
    h.fail_map_at = Some(ecam_base + (3 << 15));

    let (found, warnings) = discover(&h, rsdp);
    assert_eq!(warnings, 1);
    assert_eq!(found.functions.len(), 1);
    assert!(found.interrupted.is_some());
}
