//! Recording collaborators and synthetic firmware for bring-up tests.
//!
//! Host memory stands in for physical memory: "physical" addresses handed out
//! by [`MockMemory`] are host pointers, and `phys_to_ptr` is the identity.
#![allow(dead_code)]

use core::fmt;
use kernel_bringup::memory::map_fresh_pages;
use kernel_bringup::{
    AddressSpaceManager, Console, Cpu, DescriptorTablePointer, DiagnosticSink, GateHandlers,
    HeapAllocator, HeapError, InputDevices, InterruptController, Machine, MapError, PicMasks,
    PicOffsets, Platform,
};
use kernel_info::boot::{BootSnapshot, FramebufferInfo, Psf1Font};
use kernel_info::mmap::{MemoryDescriptor, MemoryMapInfo};
use kernel_memory_addresses::{PageRange, PhysicalAddress, VirtualAddress};
use kernel_pci::{ClassTriple, PciAddress, PciDeviceHeader, PciDriver, PciFunction};
use kernel_serial::SerialLine;
use std::cell::RefCell;
use std::rc::Rc;

pub const PAGE: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    DisableInterrupts,
    EnableInterrupts,
    LoadGdt,
    LoadIdt { limit: u16, base: u64 },
    Halt,
    Reserve { base: u64, pages: u64 },
    RequestPage(u64),
    Install(u64),
    Map { virt: u64, phys: u64 },
    Activate(u64),
    HeapInit { base: u64, pages: u64 },
    Remap(PicOffsets),
    Masks(PicMasks),
    InputInit,
    SerialInit,
    Clear(u32),
    Home,
    Foreground(u32),
}

pub type Log = Rc<RefCell<Vec<Event>>>;

/// One page-aligned page of host memory.
#[repr(C, align(4096))]
#[derive(Clone, Copy)]
pub struct Frame(pub [u8; PAGE]);

pub fn frames(n: usize) -> Box<[Frame]> {
    vec![Frame([0; PAGE]); n].into_boxed_slice()
}

pub struct MockCpu {
    log: Log,
}

impl Cpu for MockCpu {
    fn disable_interrupts(&mut self) {
        self.log.borrow_mut().push(Event::DisableInterrupts);
    }

    fn enable_interrupts(&mut self) {
        self.log.borrow_mut().push(Event::EnableInterrupts);
    }

    fn load_gdt(&mut self) {
        self.log.borrow_mut().push(Event::LoadGdt);
    }

    unsafe fn load_idt(&mut self, pointer: &DescriptorTablePointer) {
        let limit = pointer.limit;
        let base = pointer.base;
        self.log.borrow_mut().push(Event::LoadIdt {
            limit,
            base: base.as_u64(),
        });
    }

    fn halt(&mut self) -> ! {
        self.log.borrow_mut().push(Event::Halt);
        panic!("machine halted");
    }
}

pub struct MockMemory {
    log: Log,
    pool: Box<[Frame]>,
    next: usize,
    pub fail_map_at: Option<u64>,
}

impl MockMemory {
    pub fn new(log: Log, frames_available: usize) -> Self {
        Self {
            log,
            pool: frames(frames_available),
            next: 0,
            fail_map_at: None,
        }
    }
}

impl AddressSpaceManager for MockMemory {
    fn reserve(&mut self, base: PhysicalAddress, pages: u64) {
        self.log.borrow_mut().push(Event::Reserve {
            base: base.as_u64(),
            pages,
        });
    }

    fn request_page(&mut self) -> Option<PhysicalAddress> {
        let frame = self.pool.get_mut(self.next)?;
        self.next += 1;
        // Dirty, so callers must zero what they use.
        frame.0.fill(0xAA);
        let pa = PhysicalAddress::from_ptr(frame.0.as_ptr());
        self.log.borrow_mut().push(Event::RequestPage(pa.as_u64()));
        Some(pa)
    }

    fn install(&mut self, root: PhysicalAddress) {
        self.log.borrow_mut().push(Event::Install(root.as_u64()));
    }

    fn map(&mut self, virt: VirtualAddress, phys: PhysicalAddress) -> Result<(), MapError> {
        if self.fail_map_at == Some(virt.as_u64()) {
            return Err(MapError::OutOfFrames);
        }
        if virt.as_u64() % PAGE as u64 != 0 {
            return Err(MapError::Misaligned(virt));
        }
        self.log.borrow_mut().push(Event::Map {
            virt: virt.as_u64(),
            phys: phys.as_u64(),
        });
        Ok(())
    }

    fn activate(&mut self, root: PhysicalAddress) {
        self.log.borrow_mut().push(Event::Activate(root.as_u64()));
    }

    fn phys_to_ptr(&self, phys: PhysicalAddress) -> *mut u8 {
        phys.as_u64() as *mut u8
    }
}

pub struct MockHeap {
    log: Log,
}

impl HeapAllocator<MockMemory> for MockHeap {
    fn init(
        &mut self,
        memory: &mut MockMemory,
        base: VirtualAddress,
        pages: u64,
    ) -> Result<(), HeapError> {
        self.log.borrow_mut().push(Event::HeapInit {
            base: base.as_u64(),
            pages,
        });
        map_fresh_pages(memory, base, pages)?;
        Ok(())
    }
}

pub struct MockPic {
    log: Log,
}

impl InterruptController for MockPic {
    fn remap(&mut self, offsets: PicOffsets) {
        self.log.borrow_mut().push(Event::Remap(offsets));
    }

    fn set_masks(&mut self, masks: PicMasks) {
        self.log.borrow_mut().push(Event::Masks(masks));
    }
}

pub struct MockInput {
    log: Log,
}

impl InputDevices for MockInput {
    fn init(&mut self) {
        self.log.borrow_mut().push(Event::InputInit);
    }
}

pub struct MockSerial {
    log: Log,
    pub out: Rc<RefCell<String>>,
}

impl fmt::Write for MockSerial {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.out.borrow_mut().push_str(s);
        Ok(())
    }
}

impl SerialLine for MockSerial {
    fn init(&mut self) {
        self.log.borrow_mut().push(Event::SerialInit);
    }
}

pub struct MockConsole {
    log: Log,
    pub out: Rc<RefCell<String>>,
}

impl fmt::Write for MockConsole {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.out.borrow_mut().push_str(s);
        Ok(())
    }
}

impl Console for MockConsole {
    fn clear(&mut self, background: u32) {
        self.log.borrow_mut().push(Event::Clear(background));
    }

    fn home(&mut self) {
        self.log.borrow_mut().push(Event::Home);
    }

    fn set_foreground(&mut self, colour: u32) {
        self.log.borrow_mut().push(Event::Foreground(colour));
    }
}

pub struct MockAhci {
    address: PciAddress,
}

impl PciDriver for MockAhci {
    fn name(&self) -> &'static str {
        "AHCI"
    }

    fn address(&self) -> PciAddress {
        self.address
    }
}

pub struct Mock;

impl Platform for Mock {
    type Cpu = MockCpu;
    type Memory = MockMemory;
    type Heap = MockHeap;
    type Pic = MockPic;
    type Input = MockInput;
    type Serial = MockSerial;
    type Console = MockConsole;

    fn ahci_driver(function: &PciFunction) -> Box<dyn PciDriver> {
        Box::new(MockAhci {
            address: function.address,
        })
    }
}

pub const HANDLERS: GateHandlers = GateHandlers {
    page_fault: VirtualAddress::new(0xFFFF_8000_0010_0E00),
    double_fault: VirtualAddress::new(0xFFFF_8000_0010_0800),
    general_protection: VirtualAddress::new(0xFFFF_8000_0010_0D00),
    keyboard: VirtualAddress::new(0xFFFF_8000_0010_2100),
    mouse: VirtualAddress::new(0xFFFF_8000_0010_2C00),
    timer: VirtualAddress::new(0xFFFF_8000_0010_2000),
};

/// Pages of "RAM" the synthetic memory map describes.
pub const RAM_PAGES: u64 = 16;

/// Boot-time inputs with stable host addresses.
pub struct Harness {
    pub log: Log,
    pub serial: Rc<RefCell<String>>,
    pub console: Rc<RefCell<String>>,
    pub boot: BootSnapshot,
    pub frames_available: usize,
    pub fail_map_at: Option<u64>,
    _mmap: Vec<MemoryDescriptor>,
    _framebuffer: Box<[Frame]>,
}

impl Harness {
    pub fn new() -> Self {
        let mmap = vec![
            MemoryDescriptor {
                typ: 7,
                phys_start: 0,
                pages: RAM_PAGES / 2,
                ..MemoryDescriptor::default()
            },
            MemoryDescriptor {
                typ: 2,
                phys_start: RAM_PAGES / 2 * PAGE as u64,
                pages: RAM_PAGES / 2,
                ..MemoryDescriptor::default()
            },
        ];
        let mut framebuffer = frames(3);
        framebuffer.iter_mut().for_each(|f| f.0.fill(0x55));

        let boot = BootSnapshot {
            framebuffer: FramebufferInfo {
                base: framebuffer.as_ptr() as u64,
                size: 2 * PAGE as u64 + 0x100,
                width: 80,
                height: 25,
                pixels_per_scanline: 80,
            },
            font: Psf1Font {
                header: 0,
                glyphs: 0,
            },
            mmap: MemoryMapInfo {
                ptr: mmap.as_ptr() as u64,
                size: (mmap.len() * size_of::<MemoryDescriptor>()) as u64,
                desc_size: size_of::<MemoryDescriptor>() as u64,
            },
            rsdp_addr: 0,
        };

        Self {
            log: Rc::default(),
            serial: Rc::default(),
            console: Rc::default(),
            boot,
            frames_available: 64,
            fail_map_at: None,
            _mmap: mmap,
            _framebuffer: framebuffer,
        }
    }

    pub fn framebuffer_bytes(&self) -> &[u8] {
        unsafe {
            core::slice::from_raw_parts(
                self.boot.framebuffer.base as *const u8,
                self.boot.framebuffer.size as usize,
            )
        }
    }

    pub fn machine(&self) -> Machine<Mock> {
        let mut memory = MockMemory::new(self.log.clone(), self.frames_available);
        memory.fail_map_at = self.fail_map_at;
        Machine {
            cpu: MockCpu {
                log: self.log.clone(),
            },
            memory,
            heap: MockHeap {
                log: self.log.clone(),
            },
            pic: MockPic {
                log: self.log.clone(),
            },
            input: MockInput {
                log: self.log.clone(),
            },
            sink: DiagnosticSink::new(
                MockSerial {
                    log: self.log.clone(),
                    out: self.serial.clone(),
                },
                MockConsole {
                    log: self.log.clone(),
                    out: self.console.clone(),
                },
            ),
            kernel_image: PageRange::new(PhysicalAddress::new(0x10_0000), 32),
            handlers: HANDLERS,
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.log.borrow().clone()
    }
}

/// ACPI tables and one ECAM bus in host memory.
#[derive(Default)]
pub struct Firmware {
    tables: Vec<Box<[u8]>>,
    ecam: Option<Box<[Frame]>>,
}

fn checksum(bytes: &[u8]) -> u8 {
    0u8.wrapping_sub(bytes.iter().fold(0u8, |a, &b| a.wrapping_add(b)))
}

impl Firmware {
    fn place(&mut self, bytes: Vec<u8>) -> u64 {
        let boxed = bytes.into_boxed_slice();
        let addr = boxed.as_ptr() as u64;
        self.tables.push(boxed);
        addr
    }

    fn sdt(&mut self, signature: &[u8; 4], body: &[u8]) -> u64 {
        let mut t = vec![0u8; 36];
        t[0..4].copy_from_slice(signature);
        t[4..8].copy_from_slice(&u32::try_from(36 + body.len()).unwrap().to_le_bytes());
        t.extend_from_slice(body);
        t[9] = checksum(&t);
        self.place(t)
    }

    /// An ECAM region for bus 0 holding `functions`.
    pub fn ecam(&mut self, functions: &[(u8, u8, PciDeviceHeader)]) -> u64 {
        let mut bus = frames(32 * 8);
        for &(device, function, header) in functions {
            let frame = &mut bus[usize::from(device) * 8 + usize::from(function)];
            unsafe { frame.0.as_mut_ptr().cast::<PciDeviceHeader>().write(header) };
        }
        let base = bus.as_ptr() as u64;
        self.ecam = Some(bus);
        base
    }

    /// RSDP → XSDT → (FACP, MCFG) with one group covering bus 0.
    pub fn acpi_with_mcfg(&mut self, ecam_base: u64) -> u64 {
        let facp = self.sdt(b"FACP", &[0; 16]);

        let mut mcfg_body = vec![0u8; 8];
        mcfg_body.extend_from_slice(&ecam_base.to_le_bytes());
        mcfg_body.extend_from_slice(&0u16.to_le_bytes());
        mcfg_body.extend_from_slice(&[0, 1, 0, 0, 0, 0]);
        let mcfg = self.sdt(b"MCFG", &mcfg_body);

        self.acpi_with_tables(&[facp, mcfg])
    }

    /// RSDP → XSDT → `tables`.
    pub fn acpi_with_tables(&mut self, tables: &[u64]) -> u64 {
        let body: Vec<u8> = tables.iter().flat_map(|t| t.to_le_bytes()).collect();
        let xsdt = self.sdt(b"XSDT", &body);
        self.root(xsdt)
    }

    /// RSDP → an otherwise empty XSDT whose length field reads `length`.
    pub fn acpi_with_xsdt_length(&mut self, length: u32) -> u64 {
        let mut t = vec![0u8; 36];
        t[0..4].copy_from_slice(b"XSDT");
        t[4..8].copy_from_slice(&length.to_le_bytes());
        t[9] = checksum(&t);
        let xsdt = self.place(t);
        self.root(xsdt)
    }

    fn root(&mut self, xsdt: u64) -> u64 {
        let mut r = vec![0u8; 36];
        r[0..8].copy_from_slice(b"RSD PTR ");
        r[15] = 2;
        r[20..24].copy_from_slice(&36u32.to_le_bytes());
        r[24..32].copy_from_slice(&xsdt.to_le_bytes());
        r[8] = checksum(&r[0..20]);
        r[32] = checksum(&r);
        self.place(r)
    }

    pub fn table(&mut self, signature: &[u8; 4]) -> u64 {
        self.sdt(signature, &[0; 8])
    }
}

pub fn header(vendor: u16, device: u16, class: ClassTriple) -> PciDeviceHeader {
    PciDeviceHeader::new(vendor, device, class)
}

/// Position of the first event matching `pred`.
pub fn position(events: &[Event], pred: impl Fn(&Event) -> bool) -> usize {
    events
        .iter()
        .position(pred)
        .unwrap_or_else(|| panic!("event not found in {events:#?}"))
}
