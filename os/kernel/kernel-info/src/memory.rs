//! # Memory Layout

/// Granularity of every mapping made during bring-up.
pub const PAGE_SIZE: u64 = 4096;

/// Where the kernel image is placed in physical memory (and, identity
/// mapped, where it executes).
///
/// # Kernel Build
/// This information is sourced in the kernel's `build.rs` to configure
/// the linker.
pub const KERNEL_LOAD: u64 = 0x0010_0000; // 1 MiB

/// Virtual base of the kernel heap. Far above any identity-mapped RAM.
pub const HEAP_BASE: u64 = 0x0000_1000_0000_0000;

/// Pages handed to the heap allocator at bring-up.
pub const HEAP_INITIAL_PAGES: u64 = 0x10;

/// Extra pages mapped past the framebuffer's reported size.
///
/// Some firmware under-reports the buffer by a fraction of a page.
pub const FRAMEBUFFER_SLACK_PAGES: u64 = 1;

/// Size of the stack the entry trampoline switches to.
pub const BOOT_STACK_SIZE: usize = 64 * 1024;

const _: () = {
    assert!(PAGE_SIZE.is_power_of_two());
    assert!(KERNEL_LOAD % PAGE_SIZE == 0);
    assert!(HEAP_BASE % PAGE_SIZE == 0);
    assert!(BOOT_STACK_SIZE.is_multiple_of(16));
};
