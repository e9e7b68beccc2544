use kernel_memory_addresses::{PhysicalAddress, VirtualAddress};

/// Failure reported by an [`AddressSpaceManager`](crate::AddressSpaceManager).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    #[error("no free physical frames")]
    OutOfFrames,
    #[error("{0} is not page aligned")]
    Misaligned(VirtualAddress),
    #[error("no top-level page table installed")]
    NoTable,
    #[error("{virt} is already mapped to {existing}")]
    AlreadyMapped {
        virt: VirtualAddress,
        existing: PhysicalAddress,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HeapError {
    #[error("cannot back the heap")]
    Map(#[from] MapError),
    #[error("heap base {0} is not page aligned")]
    Misaligned(VirtualAddress),
    #[error("heap needs at least one page")]
    Empty,
}

/// A condition that makes continuing unsafe; reported by the panic handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BringUpError {
    #[error("out of physical frames for the {0}")]
    OutOfFrames(&'static str),
    #[error("cannot map {virt}")]
    Map {
        virt: VirtualAddress,
        #[source]
        source: MapError,
    },
    #[error("heap initialization failed")]
    Heap(#[from] HeapError),
}
