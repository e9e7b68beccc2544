mod common;

use common::{Event, Harness, MockMemory, RAM_PAGES};
use kernel_bringup::memory::map_fresh_pages;
use kernel_bringup::{BringUpError, MapError, prepare_memory};
use kernel_memory_addresses::{PageRange, PhysicalAddress, Size4K, VirtualAddress};
use std::collections::BTreeMap;

const PAGE: u64 = 4096;

fn kernel_image() -> PageRange<Size4K> {
    PageRange::new(PhysicalAddress::new(0x10_0000), 32)
}

fn map_counts(events: &[Event]) -> BTreeMap<u64, usize> {
    let mut counts = BTreeMap::new();
    for e in events {
        if let Event::Map { virt, phys } = e {
            assert_eq!(virt, phys, "identity mapping expected");
            *counts.entry(*virt).or_default() += 1;
        }
    }
    counts
}

#[test]
fn ram_and_framebuffer_are_each_mapped_once() {
    let mut h = Harness::new();
    // Straddles the end of RAM: four pages inside, the rest outside.
    h.boot.framebuffer.base = (RAM_PAGES - 4) * PAGE;
    h.boot.framebuffer.size = 5 * PAGE;

    let mut memory = MockMemory::new(h.log.clone(), 4);
    let root = unsafe { prepare_memory(&mut memory, &h.boot, kernel_image()) }.unwrap();

    let counts = map_counts(&h.events());
    // Framebuffer plus one slack page ends six pages after its base.
    let expected: Vec<u64> = (0..RAM_PAGES + 2).map(|p| p * PAGE).collect();
    assert_eq!(counts.keys().copied().collect::<Vec<_>>(), expected);
    assert!(counts.values().all(|&n| n == 1));

    assert_eq!(h.events().last(), Some(&Event::Activate(root.as_u64())));
}

#[test]
fn kernel_and_framebuffer_frames_are_reserved_first() {
    let mut h = Harness::new();
    h.boot.framebuffer.base = 0x8000_0000;
    h.boot.framebuffer.size = 3 * PAGE + 1;

    let mut memory = MockMemory::new(h.log.clone(), 4);
    unsafe { prepare_memory(&mut memory, &h.boot, kernel_image()) }.unwrap();
    let events = h.events();

    assert_eq!(
        events[0],
        Event::Reserve {
            base: 0x10_0000,
            pages: 32,
        }
    );
    // Whole pages of the framebuffer plus one.
    assert_eq!(
        events[1],
        Event::Reserve {
            base: 0x8000_0000,
            pages: 4,
        }
    );
    assert!(matches!(events[2], Event::RequestPage(_)));

    let counts = map_counts(&events);
    // RAM, then the framebuffer's five pages (size + slack, rounded up).
    assert_eq!(counts.len() as u64, RAM_PAGES + 5);
    for p in 0..5 {
        assert_eq!(counts.get(&(0x8000_0000 + p * PAGE)), Some(&1));
    }
}

#[test]
fn no_frame_for_root_table_is_an_error() {
    let h = Harness::new();
    let mut memory = MockMemory::new(h.log.clone(), 0);
    let err = unsafe { prepare_memory(&mut memory, &h.boot, kernel_image()) }.unwrap_err();
    assert_eq!(err, BringUpError::OutOfFrames("top-level page table"));
    assert!(!h.events().iter().any(|e| matches!(e, Event::Map { .. })));
}

#[test]
fn map_failure_names_the_page() {
    let h = Harness::new();
    let mut memory = MockMemory::new(h.log.clone(), 1);
    memory.fail_map_at = Some(0x5000);
    let err = unsafe { prepare_memory(&mut memory, &h.boot, kernel_image()) }.unwrap_err();
    assert_eq!(
        err,
        BringUpError::Map {
            virt: VirtualAddress::new(0x5000),
            source: MapError::OutOfFrames,
        }
    );
    assert!(!h.events().iter().any(|e| matches!(e, Event::Activate(_))));
}

#[test]
fn fresh_pages_reject_misaligned_base() {
    let h = Harness::new();
    let mut memory = MockMemory::new(h.log.clone(), 4);
    let base = VirtualAddress::new(0x1000_0000_0010);
    assert_eq!(
        map_fresh_pages(&mut memory, base, 1),
        Err(MapError::Misaligned(base))
    );
}

#[test]
fn fresh_pages_stop_when_frames_run_out() {
    let h = Harness::new();
    let mut memory = MockMemory::new(h.log.clone(), 2);
    let base = VirtualAddress::new(0x1000_0000_0000);
    assert_eq!(
        map_fresh_pages(&mut memory, base, 3),
        Err(MapError::OutOfFrames)
    );
    assert_eq!(map_counts(&h.events()).len(), 2);
}
