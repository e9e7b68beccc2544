use crate::discovery::{Discovery, discover_pci};
use crate::gates::{DescriptorTablePointer, install_gates};
use crate::memory::{clear_framebuffer, prepare_memory};
use crate::pic::configure_pic;
use crate::platform::{
    Console, Cpu, HeapAllocator, InputDevices, InterruptController, Machine, Platform,
};
use crate::{BringUpConfig, BringUpError, DiagnosticSink};
use core::fmt;
use kernel_info::boot::BootSnapshot;
use kernel_memory_addresses::PhysicalAddress;
use kernel_pci::{ClassTriple, DriverRegistry};
use kernel_serial::SerialLine;

/// The bring-up steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BringUpStep {
    MaskInterrupts,
    InitDiagnostics,
    LoadGdt,
    SetUpPaging,
    ClearFramebuffer,
    InitHeap,
    SetUpInterrupts,
    InitInput,
    DiscoverPci,
    ConfigurePic,
    EnableInterrupts,
}

impl BringUpStep {
    pub const ALL: [Self; 11] = [
        Self::MaskInterrupts,
        Self::InitDiagnostics,
        Self::LoadGdt,
        Self::SetUpPaging,
        Self::ClearFramebuffer,
        Self::InitHeap,
        Self::SetUpInterrupts,
        Self::InitInput,
        Self::DiscoverPci,
        Self::ConfigurePic,
        Self::EnableInterrupts,
    ];

    /// 1-based position in [`ALL`](Self::ALL).
    #[must_use]
    pub const fn number(self) -> usize {
        self as usize + 1
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::MaskInterrupts => "Disabling interrupts",
            Self::InitDiagnostics => "Initializing serial diagnostics",
            Self::LoadGdt => "Loading GDT",
            Self::SetUpPaging => "Setting up paging",
            Self::ClearFramebuffer => "Clearing framebuffer",
            Self::InitHeap => "Initializing heap",
            Self::SetUpInterrupts => "Installing interrupt gates and remapping PIC",
            Self::InitInput => "Initializing input devices",
            Self::DiscoverPci => "Discovering ACPI and PCI devices",
            Self::ConfigurePic => "Programming PIC masks",
            Self::EnableInterrupts => "Enabling interrupts",
        }
    }
}

impl fmt::Display for BringUpStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[*] ({}/{}) {}",
            self.number(),
            Self::ALL.len(),
            self.description()
        )
    }
}

/// Everything bring-up produced, handed back to the kernel.
pub struct KernelContext<P: Platform> {
    pub cpu: P::Cpu,
    /// The live address space.
    pub memory: P::Memory,
    pub heap: P::Heap,
    pub pic: P::Pic,
    pub input: P::Input,
    pub sink: DiagnosticSink<P::Serial, P::Console>,
    pub page_table_root: PhysicalAddress,
    pub gate_table: DescriptorTablePointer,
    pub pci: Discovery,
}

fn announce<S: SerialLine, R: Console>(sink: &mut DiagnosticSink<S, R>, step: BringUpStep) {
    sink.emit(format_args!("{step}"));
    log::debug!("bring-up step {}", step.number());
}

/// Run the eleven bring-up steps and return the populated context.
///
/// Halts through [`panic::halt`](crate::panic::halt) if a step fails; ACPI
/// and PCI trouble only produces warnings.
///
/// # Safety
/// `boot` must describe the running machine: its memory map readable, its
/// framebuffer and ACPI tables at the physical addresses it names, and the
/// firmware's identity map still active on entry.
pub unsafe fn bring_up<P: Platform + 'static>(
    machine: Machine<P>,
    boot: &BootSnapshot,
    config: &BringUpConfig,
) -> KernelContext<P> {
    let Machine {
        mut cpu,
        mut memory,
        mut heap,
        mut pic,
        mut input,
        mut sink,
        kernel_image,
        handlers,
    } = machine;

    announce(&mut sink, BringUpStep::MaskInterrupts);
    cpu.disable_interrupts();

    announce(&mut sink, BringUpStep::InitDiagnostics);
    sink.init();
    for step in [BringUpStep::MaskInterrupts, BringUpStep::InitDiagnostics] {
        sink.emit_serial(format_args!("{step}"));
    }

    announce(&mut sink, BringUpStep::LoadGdt);
    cpu.load_gdt();

    announce(&mut sink, BringUpStep::SetUpPaging);
    // SAFETY: forwarded from the caller.
    let page_table_root = match unsafe { prepare_memory(&mut memory, boot, kernel_image) } {
        Ok(root) => root,
        Err(err) => sink.halt(&mut cpu, &err),
    };

    announce(&mut sink, BringUpStep::ClearFramebuffer);
    // SAFETY: the framebuffer was identity mapped by the previous step.
    unsafe { clear_framebuffer(&memory, &boot.framebuffer) };

    announce(&mut sink, BringUpStep::InitHeap);
    if let Err(err) = heap.init(&mut memory, config.heap_base, config.heap_pages) {
        sink.halt(&mut cpu, &BringUpError::from(err));
    }

    announce(&mut sink, BringUpStep::SetUpInterrupts);
    let gate_table = match install_gates(&mut memory, &mut cpu, &handlers, config.pic_offsets) {
        Ok((pointer, _frame)) => pointer,
        Err(err) => sink.halt(&mut cpu, &err),
    };
    configure_pic(&mut pic, config.pic_offsets);

    announce(&mut sink, BringUpStep::InitInput);
    input.init();

    announce(&mut sink, BringUpStep::DiscoverPci);
    let mut registry = DriverRegistry::new();
    registry.register(ClassTriple::AHCI, P::ahci_driver);
    // SAFETY: ACPI tables live in memory mapped at step 4.
    let pci = unsafe { discover_pci(&mut memory, &mut sink, boot.rsdp(), &registry, config.probe) };

    announce(&mut sink, BringUpStep::ConfigurePic);
    pic.set_masks(config.pic_masks);

    announce(&mut sink, BringUpStep::EnableInterrupts);
    cpu.enable_interrupts();

    KernelContext {
        cpu,
        memory,
        heap,
        pic,
        input,
        sink,
        page_table_root,
        gate_table,
        pci,
    }
}
