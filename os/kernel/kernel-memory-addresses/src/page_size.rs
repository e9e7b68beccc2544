use core::fmt;
use core::hash::Hash;

mod sealed {
    pub trait Sealed {}
}

/// Page granularity marker. Only this crate implements it.
pub trait PageSize:
    sealed::Sealed + Clone + Copy + Eq + PartialEq + Ord + PartialOrd + Hash + fmt::Debug
{
    /// Bytes per page.
    const SIZE: u64;
    /// Number of offset bits below the page number.
    const SHIFT: u32;
}

/// 4 KiB page (4096 bytes), the only granularity bring-up maps with.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Size4K;
impl sealed::Sealed for Size4K {}
impl PageSize for Size4K {
    const SIZE: u64 = 4096;
    const SHIFT: u32 = 12;
}

const _: () = assert!(1u64 << Size4K::SHIFT == Size4K::SIZE);
