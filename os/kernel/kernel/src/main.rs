//! # Kernel Entry Point
//!
//! The loader jumps to [`_start_kernel`] with interrupts off, the firmware's
//! identity map active and a [`BootSnapshot`] pointer in `RDI`. The entry
//! stub switches to [`BOOT_STACK`] and calls [`kernel_entry`], which wires the
//! hardware implementations below into a [`Machine`] and runs
//! [`bring_up`].
//!
//! Module | Contract
//! -------|---------
//! [`cpu`] | [`Cpu`](kernel_bringup::Cpu) (`cli`/`sti`, GDT, `lidt`, `hlt`)
//! [`paging`], [`frames`] | [`AddressSpaceManager`](kernel_bringup::AddressSpaceManager)
//! [`heap`] | [`HeapAllocator`](kernel_bringup::HeapAllocator), global allocator
//! [`pic`] | [`InterruptController`](kernel_bringup::InterruptController)
//! [`input`] | [`InputDevices`](kernel_bringup::InputDevices)
//! [`serial`], [`console`] | the diagnostic sink's two outputs
//! [`interrupts`] | gate entry stubs
//! [`ahci`] | the AHCI [`PciDriver`]

#![no_std]
#![no_main]
#![allow(unsafe_code)]

extern crate alloc;

mod ahci;
mod console;
mod cpu;
mod frames;
mod gdt;
mod heap;
mod input;
mod interrupts;
mod paging;
mod pic;
mod serial;

use alloc::boxed::Box;
use console::Screen;
use cpu::X86Cpu;
use frames::FrameBitmap;
use heap::KernelHeap;
use input::Ps2Controller;
use kernel_bringup::{
    BringUpConfig, DiagnosticSink, KernelContext, Machine, Platform, bring_up,
};
use kernel_info::boot::BootSnapshot;
use kernel_info::memory::BOOT_STACK_SIZE;
use kernel_memory_addresses::{PageRange, PhysicalAddress, Size4K};
use kernel_pci::{PciDriver, PciFunction};
use kernel_serial::{SerialLogger, serial_trace};
use log::LevelFilter;
use paging::KernelMemory;
use pic::Pic8259;
use serial::Com1;

/// Compile-time log level for the serial logger.
const LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// 16-byte aligned stack
#[repr(align(16))]
struct Aligned<const N: usize>([u8; N]);

#[unsafe(link_section = ".bss.boot")]
#[unsafe(no_mangle)]
static mut BOOT_STACK: Aligned<BOOT_STACK_SIZE> = Aligned([0; BOOT_STACK_SIZE]);

unsafe extern "C" {
    /// First byte of the image (linker script).
    safe static _kernel_start: u8;
    /// One past the last page of the image (linker script).
    safe static _kernel_end: u8;
}

/// The kernel entry point.
///
/// # ABI
/// System V: `boot` arrives in `RDI` and is left there for [`kernel_entry`].
///
/// # Naked function & Stack
/// Naked so that the compiler emits no prologue touching the loader's stack
/// before we switch to [`BOOT_STACK`].
#[unsafe(no_mangle)]
#[unsafe(naked)]
pub extern "sysv64" fn _start_kernel(_boot: *const BootSnapshot) -> ! {
    core::arch::naked_asm!(
        "cli",
        "lea rax, [rip + {stack_sym}]",
        "add rax, {stack_size}",
        "and rax, -16",
        "mov rsp, rax",
        "xor rbp, rbp",
        // `call` leaves RSP % 16 == 8 at entry, as the ABI expects.
        "call {rust_entry}",
        "2: hlt",
        "jmp 2b",
        stack_sym = sym BOOT_STACK,
        stack_size = const BOOT_STACK_SIZE,
        rust_entry = sym kernel_entry,
    );
}

/// The hardware this kernel runs on.
enum Kernel {}

impl Platform for Kernel {
    type Cpu = X86Cpu;
    type Memory = KernelMemory;
    type Heap = KernelHeap;
    type Pic = Pic8259;
    type Input = Ps2Controller;
    type Serial = Com1;
    type Console = Screen;

    fn ahci_driver(function: &PciFunction) -> Box<dyn PciDriver> {
        Box::new(ahci::AhciController::bind(function))
    }
}

fn kernel_image() -> PageRange<Size4K> {
    let start = PhysicalAddress::from_ptr(&raw const _kernel_start);
    let end = (&raw const _kernel_end) as u64;
    PageRange::covering(start, end - start.as_u64())
}

#[unsafe(no_mangle)]
extern "C" fn kernel_entry(boot: *const BootSnapshot) -> ! {
    if let Err(e) = SerialLogger::new(LOG_LEVEL).init() {
        serial_trace!("logger: {e}\n");
    }

    // SAFETY: the loader hands over a valid snapshot that outlives the kernel.
    let boot = unsafe { &*boot };
    // SAFETY: firmware identity map is still live; the font is the loader's.
    unsafe { console::init(&boot.framebuffer, &boot.font) };

    // SAFETY: boot services are gone; conventional memory is ours.
    let Some(frames) = (unsafe { FrameBitmap::from_memory_map(&boot.mmap) }) else {
        panic!("the firmware memory map lists no usable memory");
    };

    // SAFETY: each hardware handle is created exactly once, here.
    let machine = unsafe {
        Machine::<Kernel> {
            cpu: X86Cpu::new(),
            memory: KernelMemory::new(frames),
            heap: KernelHeap::new(),
            pic: Pic8259::new(),
            input: Ps2Controller::new(),
            sink: DiagnosticSink::new(Com1, Screen),
            kernel_image: kernel_image(),
            handlers: interrupts::handlers(),
        }
    };

    // SAFETY: `boot` describes this machine and the firmware map is active.
    let mut ctx = unsafe { bring_up(machine, boot, &BringUpConfig::default()) };
    summary(&mut ctx, boot);

    let mut activity = input::InputActivity::default();
    cpu::idle(|| activity.poll())
}

/// Print what bring-up found.
fn summary(ctx: &mut KernelContext<Kernel>, boot: &BootSnapshot) {
    let fb = &boot.framebuffer;
    let frames = ctx.memory.frames();
    let (heap_size, heap_used) = ctx.heap.usage();
    let (free, used, reserved) = (
        frames.free_bytes(),
        frames.used_bytes(),
        frames.reserved_bytes(),
    );
    let warnings = ctx.sink.warnings();
    let sink = &mut ctx.sink;

    sink.emit(format_args!("[*] Bring-up complete"));
    sink.emit(format_args!(
        "    Framebuffer: {}x{} (stride {}) at {:#x}, {} bytes in {} pages",
        fb.width,
        fb.height,
        fb.pixels_per_scanline,
        fb.base,
        fb.size,
        fb.page_count()
    ));
    sink.emit(format_args!(
        "    Memory map: {} descriptors",
        boot.mmap.entries()
    ));
    sink.emit(format_args!(
        "    Frames: {} KiB free, {} KiB used, {} KiB reserved",
        free / 1024,
        used / 1024,
        reserved / 1024
    ));
    sink.emit(format_args!(
        "    Page tables: {}, heap {heap_used}/{heap_size} bytes",
        ctx.page_table_root
    ));
    match &ctx.pci.acpi {
        Ok(groups) => sink.emit(format_args!("    ACPI: {groups} ECAM group(s)")),
        Err(e) => sink.emit(format_args!("    ACPI: unavailable ({e})")),
    }
    sink.emit(format_args!(
        "    PCI: {} function(s), {} driver(s)",
        ctx.pci.functions.len(),
        ctx.pci.drivers.len()
    ));
    sink.emit(format_args!("    Warnings: {warnings}"));
    log::info!("idle; {} timer ticks so far", interrupts::ticks());
}

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    // SAFETY: nothing that held these locks will run again.
    unsafe {
        console::force_unlock();
        if kernel_serial::COM1_PORT.is_locked() {
            kernel_serial::COM1_PORT.force_unlock();
        }
    }
    if let Some(location) = info.location() {
        serial_trace!("panic at {location}\n");
    }

    // SAFETY: the panic path replaces the bring-up handle for good.
    let mut cpu = unsafe { X86Cpu::new() };
    let mut sink = DiagnosticSink::attached(Com1, Screen);
    kernel_bringup::panic::halt(&mut sink, &mut cpu, &info.message())
}
