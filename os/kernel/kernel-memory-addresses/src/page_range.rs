use crate::{PageSize, PhysicalAddress};
use core::marker::PhantomData;

/// A half-open run of whole `S` pages: `[start, start + len * S::SIZE)`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PageRange<S: PageSize> {
    start: u64,
    pages: u64,
    _phantom: PhantomData<S>,
}

impl<S: PageSize> PageRange<S> {
    /// `pages` pages starting at the page containing `start`.
    #[inline]
    #[must_use]
    pub const fn new(start: PhysicalAddress, pages: u64) -> Self {
        Self {
            start: start.align_down::<S>().as_u64(),
            pages,
            _phantom: PhantomData,
        }
    }

    /// The smallest range of pages that contains every byte of `[start, start + len)`.
    #[must_use]
    pub const fn covering(start: PhysicalAddress, len: u64) -> Self {
        let first = start.align_down::<S>().as_u64();
        let last = start.as_u64().saturating_add(len);
        let pages = (last - first).div_ceil(S::SIZE);
        Self {
            start: first,
            pages,
            _phantom: PhantomData,
        }
    }

    #[inline]
    #[must_use]
    pub const fn start(&self) -> PhysicalAddress {
        PhysicalAddress::new(self.start)
    }

    /// First address past the range.
    #[inline]
    #[must_use]
    pub const fn end(&self) -> PhysicalAddress {
        PhysicalAddress::new(self.start.saturating_add(self.pages.saturating_mul(S::SIZE)))
    }

    #[inline]
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.pages
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.pages == 0
    }

    #[inline]
    #[must_use]
    pub const fn contains(&self, addr: PhysicalAddress) -> bool {
        addr.as_u64() >= self.start && addr.as_u64() < self.end().as_u64()
    }

    /// Page base addresses in ascending order.
    #[inline]
    #[must_use]
    pub const fn iter(&self) -> PageIter<S> {
        PageIter {
            next: self.start,
            remaining: self.pages,
            _phantom: PhantomData,
        }
    }
}

impl<S: PageSize> IntoIterator for PageRange<S> {
    type Item = PhysicalAddress;
    type IntoIter = PageIter<S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the page bases of a [`PageRange`].
#[derive(Clone, Debug)]
pub struct PageIter<S: PageSize> {
    next: u64,
    remaining: u64,
    _phantom: PhantomData<S>,
}

impl<S: PageSize> Iterator for PageIter<S> {
    type Item = PhysicalAddress;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let page = PhysicalAddress::new(self.next);
        self.remaining -= 1;
        self.next = self.next.wrapping_add(S::SIZE);
        Some(page)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        (n, Some(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Size4K;

    #[test]
    fn covering_rounds_both_ends() {
        let r = PageRange::<Size4K>::covering(PhysicalAddress::new(0x1FFF), 2);
        assert_eq!(r.start(), PhysicalAddress::new(0x1000));
        assert_eq!(r.len(), 2);
        assert_eq!(r.end(), PhysicalAddress::new(0x3000));
    }

    #[test]
    fn empty_covering_has_no_pages() {
        let r = PageRange::<Size4K>::covering(PhysicalAddress::new(0x4000), 0);
        assert!(r.is_empty());
        assert_eq!(r.iter().count(), 0);
    }

    #[test]
    fn iterates_page_bases_in_order() {
        let r = PageRange::<Size4K>::new(PhysicalAddress::new(0x10_0000), 3);
        let pages: Vec<u64> = r.iter().map(PhysicalAddress::as_u64).collect();
        assert_eq!(pages, [0x10_0000, 0x10_1000, 0x10_2000]);
        assert!(r.contains(PhysicalAddress::new(0x10_2FFF)));
        assert!(!r.contains(PhysicalAddress::new(0x10_3000)));
    }
}
