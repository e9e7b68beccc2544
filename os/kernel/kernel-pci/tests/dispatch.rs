//! Class-triple driver dispatch.

use kernel_memory_addresses::PhysicalAddress;
use kernel_pci::{
    ClassTriple, DriverRegistry, PciAddress, PciDeviceHeader, PciDriver, PciFunction,
};
use std::cell::RefCell;
use std::rc::Rc;

struct Recorded {
    address: PciAddress,
}

impl PciDriver for Recorded {
    fn name(&self) -> &'static str {
        "ahci"
    }

    fn address(&self) -> PciAddress {
        self.address
    }
}

fn function(device: u8, class: ClassTriple) -> PciFunction {
    let address = PciAddress::new(0, 0, device, 0);
    PciFunction {
        address,
        config: PhysicalAddress::new(0xB000_0000 + address.ecam_offset()),
        header: PciDeviceHeader::new(0x8086, 0x2922, class),
    }
}

fn ahci_registry() -> (DriverRegistry, Rc<RefCell<Vec<PciFunction>>>) {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let seen = Rc::clone(&calls);
    let mut registry = DriverRegistry::new();
    registry.register(ClassTriple::AHCI, move |f: &PciFunction| {
        seen.borrow_mut().push(*f);
        Box::new(Recorded { address: f.address }) as Box<dyn PciDriver>
    });
    (registry, calls)
}

#[test]
fn ahci_function_constructs_exactly_one_driver() {
    let (registry, calls) = ahci_registry();
    let ahci = function(0x1F, ClassTriple::new(0x01, 0x06, 0x01));

    let driver = registry.dispatch(&ahci).expect("AHCI is registered");

    assert_eq!(driver.address(), ahci.address);
    assert_eq!(calls.borrow().as_slice(), &[ahci], "constructor bound to this header");
}

#[test]
fn sata_without_ahci_interface_constructs_nothing() {
    let (registry, calls) = ahci_registry();
    let vendor_specific = function(0x1F, ClassTriple::new(0x01, 0x06, 0x00));
    assert!(registry.dispatch(&vendor_specific).is_none());
    assert!(calls.borrow().is_empty());
}

#[test]
fn each_matching_function_gets_its_own_instance() {
    let (registry, calls) = ahci_registry();
    let drivers: Vec<_> = [3, 4]
        .into_iter()
        .map(|d| function(d, ClassTriple::AHCI))
        .filter_map(|f| registry.dispatch(&f))
        .collect();
    assert_eq!(drivers.len(), 2);
    assert_eq!(calls.borrow().len(), 2);
    assert_ne!(drivers[0].address(), drivers[1].address());
}
