use kernel_memory_addresses::PhysicalAddress;

/// Why ACPI discovery stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AcpiError {
    #[error("no ACPI root pointer was provided")]
    NullRoot,
    #[error("root pointer at {0} has no \"RSD PTR \" signature")]
    BadRootSignature(PhysicalAddress),
    #[error("root pointer at {0} fails its checksum")]
    BadRootChecksum(PhysicalAddress),
    #[error("root pointer at {addr} declares length {length}")]
    BadRootLength { addr: PhysicalAddress, length: u32 },
    #[error("ACPI revision {0} root carries no XSDT")]
    NoXsdt(u8),
    #[error("table at {addr} has signature {found:?}, expected {expected:?}")]
    UnexpectedSignature {
        addr: PhysicalAddress,
        expected: [u8; 4],
        found: [u8; 4],
    },
    #[error("table at {addr} declares length {length}, too short for its layout")]
    Truncated { addr: PhysicalAddress, length: u32 },
    #[error("table at {addr} declares length {length}, over the {limit}-byte limit")]
    Oversized {
        addr: PhysicalAddress,
        length: u32,
        limit: usize,
    },
    #[error("table at {addr} declares length {length}, not a whole number of {record}-byte records")]
    RaggedLength {
        addr: PhysicalAddress,
        length: u32,
        record: usize,
    },
    #[error("table at {0} fails its checksum")]
    BadTableChecksum(PhysicalAddress),
    #[error("no {0:?} table in the XSDT")]
    TableNotFound([u8; 4]),
}
