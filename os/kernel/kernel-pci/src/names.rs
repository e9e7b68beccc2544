//! Human-readable names for PCI ids, used in diagnostics only.
//!
//! Lookups return `None` for ids not in the tables; [`Named`] falls back to
//! printing the raw id in hex.

use core::fmt;

const CLASSES: [&str; 20] = [
    "Unclassified",
    "Mass Storage Controller",
    "Network Controller",
    "Display Controller",
    "Multimedia Controller",
    "Memory Controller",
    "Bridge Device",
    "Simple Communication Controller",
    "Base System Peripheral",
    "Input Device Controller",
    "Docking Station",
    "Processor",
    "Serial Bus Controller",
    "Wireless Controller",
    "Intelligent Controller",
    "Satellite Communication Controller",
    "Encryption Controller",
    "Signal Processing Controller",
    "Processing Accelerator",
    "Non Essential Instrumentation",
];

#[must_use]
pub const fn vendor_name(vendor: u16) -> Option<&'static str> {
    Some(match vendor {
        0x8086 => "Intel Corp",
        0x1022 => "AMD",
        0x10DE => "NVIDIA Corporation",
        0x1234 => "QEMU",
        0x1AF4 | 0x1B36 => "Red Hat, Inc.",
        0x15AD => "VMware",
        0x80EE => "InnoTek (VirtualBox)",
        _ => return None,
    })
}

#[must_use]
pub const fn device_name(vendor: u16, device: u16) -> Option<&'static str> {
    Some(match (vendor, device) {
        (0x8086, 0x29C0) => "Express DRAM Controller",
        (0x8086, 0x2918) => "LPC Interface Controller",
        (0x8086, 0x2922) => "6 port SATA Controller [AHCI mode]",
        (0x8086, 0x2930) => "SMBus Controller",
        (0x8086, 0x10D3) => "82574L Gigabit Network Connection",
        (0x8086, 0x100E) => "82540EM Gigabit Ethernet Controller",
        (0x8086, 0x1237) => "440FX - 82441FX PMC [Natoma]",
        (0x1234, 0x1111) => "Standard VGA",
        (0x1AF4, 0x1000) => "Virtio network device",
        (0x1AF4, 0x1001) => "Virtio block device",
        (0x1B36, 0x000D) => "QEMU XHCI Host Controller",
        _ => return None,
    })
}

#[must_use]
pub const fn class_name(class: u8) -> Option<&'static str> {
    let i = class as usize;
    if i < CLASSES.len() { Some(CLASSES[i]) } else { None }
}

#[must_use]
pub const fn subclass_name(class: u8, subclass: u8) -> Option<&'static str> {
    Some(match (class, subclass) {
        (0x01, 0x00) => "SCSI Bus Controller",
        (0x01, 0x01) => "IDE Controller",
        (0x01, 0x02) => "Floppy Disk Controller",
        (0x01, 0x03) => "IPI Bus Controller",
        (0x01, 0x04) => "RAID Controller",
        (0x01, 0x05) => "ATA Controller",
        (0x01, 0x06) => "Serial ATA",
        (0x01, 0x07) => "Serial Attached SCSI",
        (0x01, 0x08) => "Non-Volatile Memory Controller",
        (0x01, 0x80) => "Other",
        (0x02, 0x00) => "Ethernet Controller",
        (0x03, 0x00) => "VGA Compatible Controller",
        (0x03, 0x01) => "XGA Controller",
        (0x03, 0x80) => "Other",
        (0x06, 0x00) => "Host Bridge",
        (0x06, 0x01) => "ISA Bridge",
        (0x06, 0x04) => "PCI-to-PCI Bridge",
        (0x06, 0x80) => "Other",
        (0x0C, 0x03) => "USB Controller",
        (0x0C, 0x05) => "SMBus",
        _ => return None,
    })
}

#[must_use]
pub const fn prog_if_name(class: u8, subclass: u8, prog_if: u8) -> Option<&'static str> {
    Some(match (class, subclass, prog_if) {
        (0x01, 0x06, 0x00) => "Vendor Specific Interface",
        (0x01, 0x06, 0x01) => "AHCI 1.0",
        (0x01, 0x06, 0x02) => "Serial Storage Bus",
        (0x01, 0x08, 0x02) => "NVM Express",
        (0x03, 0x00, 0x00) => "VGA Controller",
        (0x06, 0x04, 0x00) => "Normal Decode",
        (0x06, 0x04, 0x01) => "Subtractive Decode",
        (0x0C, 0x03, 0x00) => "UHCI Controller",
        (0x0C, 0x03, 0x10) => "OHCI Controller",
        (0x0C, 0x03, 0x20) => "EHCI (USB2) Controller",
        (0x0C, 0x03, 0x30) => "XHCI (USB3) Controller",
        _ => return None,
    })
}

/// A looked-up name that prints as hex when the lookup failed.
#[derive(Debug, Clone, Copy)]
pub struct Named<T> {
    pub name: Option<&'static str>,
    pub id: T,
}

impl<T: fmt::LowerHex> fmt::Display for Named<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name {
            Some(name) => f.write_str(name),
            None => write!(f, "{:#x}", self.id),
        }
    }
}
