//! # PS/2 Keyboard and Mouse
//!
//! The keyboard needs no setup beyond its PIC line. The mouse is the
//! controller's auxiliary device and is switched on here:
//!
//! 1. `0xA8` enable the auxiliary port.
//! 2. Read the controller configuration byte (`0x20`), set bit 1 (IRQ12),
//!    write it back (`0x60`).
//! 3. `0xF6` restore mouse defaults, `0xF4` enable streaming; each is
//!    acknowledged with one byte.
//!
//! Mouse data arrives as 3-byte packets, one byte per IRQ12.
//!
//! The IRQ handlers never log. They publish what they saw through atomics,
//! and [`InputActivity::poll`] reports changes from thread context.

use kernel_bringup::InputDevices;
use kernel_serial::ports::{inb, outb};
use core::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use spin::Mutex;

const DATA: u16 = 0x60;
const STATUS: u16 = 0x64;
const COMMAND: u16 = 0x64;

const STATUS_OUTPUT_FULL: u8 = 1 << 0;
const STATUS_INPUT_FULL: u8 = 1 << 1;

const ENABLE_AUX: u8 = 0xA8;
const READ_CONFIG: u8 = 0x20;
const WRITE_CONFIG: u8 = 0x60;
const WRITE_AUX: u8 = 0xD4;
const CONFIG_AUX_IRQ: u8 = 1 << 1;

const MOUSE_SET_DEFAULTS: u8 = 0xF6;
const MOUSE_ENABLE_STREAMING: u8 = 0xF4;

/// Polls before giving up on the controller.
const TIMEOUT: u32 = 100_000;

fn wait_writable() {
    for _ in 0..TIMEOUT {
        if unsafe { inb(STATUS) } & STATUS_INPUT_FULL == 0 {
            return;
        }
        core::hint::spin_loop();
    }
}

fn wait_readable() {
    for _ in 0..TIMEOUT {
        if unsafe { inb(STATUS) } & STATUS_OUTPUT_FULL != 0 {
            return;
        }
        core::hint::spin_loop();
    }
}

fn command(cmd: u8) {
    wait_writable();
    unsafe { outb(COMMAND, cmd) };
}

fn write_data(value: u8) {
    wait_writable();
    unsafe { outb(DATA, value) };
}

fn read_data() -> u8 {
    wait_readable();
    unsafe { inb(DATA) }
}

fn mouse_write(value: u8) {
    command(WRITE_AUX);
    write_data(value);
}

pub struct Ps2Controller(());

impl Ps2Controller {
    /// # Safety
    /// Only one handle may drive the controller.
    pub const unsafe fn new() -> Self {
        Self(())
    }
}

impl InputDevices for Ps2Controller {
    fn init(&mut self) {
        command(ENABLE_AUX);

        command(READ_CONFIG);
        let config = read_data() | CONFIG_AUX_IRQ;
        command(WRITE_CONFIG);
        write_data(config);

        mouse_write(MOUSE_SET_DEFAULTS);
        let ack = read_data();
        mouse_write(MOUSE_ENABLE_STREAMING);
        let ack2 = read_data();
        log::debug!("PS/2 mouse enabled (config {config:#04x}, acks {ack:#04x} {ack2:#04x})");
    }
}

static KEYSTROKES: AtomicU64 = AtomicU64::new(0);
static LAST_SCANCODE: AtomicU32 = AtomicU32::new(0);
static POINTER_X: AtomicU32 = AtomicU32::new(0);
static POINTER_Y: AtomicU32 = AtomicU32::new(0);

/// Keyboard IRQ: consume the scancode so the controller raises the next one.
pub fn on_keyboard() {
    let scancode = unsafe { inb(DATA) };
    LAST_SCANCODE.store(u32::from(scancode), Ordering::Relaxed);
    KEYSTROKES.fetch_add(1, Ordering::Relaxed);
}

/// Input seen so far, as published by the IRQ handlers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputActivity {
    keystrokes: u64,
    pointer: (u32, u32),
}

impl InputActivity {
    fn now() -> Self {
        Self {
            keystrokes: KEYSTROKES.load(Ordering::Relaxed),
            pointer: (
                POINTER_X.load(Ordering::Relaxed),
                POINTER_Y.load(Ordering::Relaxed),
            ),
        }
    }

    /// Log whatever changed since the last call. Thread context only.
    pub fn poll(&mut self) {
        let now = Self::now();
        if now.keystrokes != self.keystrokes {
            log::trace!(
                "scancode {:#04x} ({} keystrokes)",
                LAST_SCANCODE.load(Ordering::Relaxed),
                now.keystrokes
            );
        }
        if now.pointer != self.pointer {
            log::trace!("mouse at ({}, {})", now.pointer.0, now.pointer.1);
        }
        *self = now;
    }
}

/// Assembles 3-byte mouse packets into a pointer position.
struct MouseState {
    packet: [u8; 3],
    cycle: usize,
    x: i32,
    y: i32,
}

/// Packet byte 0: bit 3 is always set.
const PACKET_SYNC: u8 = 1 << 3;
const PACKET_X_SIGN: u8 = 1 << 4;
const PACKET_Y_SIGN: u8 = 1 << 5;
const PACKET_X_OVERFLOW: u8 = 1 << 6;
const PACKET_Y_OVERFLOW: u8 = 1 << 7;

impl MouseState {
    const fn new() -> Self {
        Self {
            packet: [0; 3],
            cycle: 0,
            x: 0,
            y: 0,
        }
    }

    fn push(&mut self, byte: u8) {
        if self.cycle == 0 && byte & PACKET_SYNC == 0 {
            // Out of sync; wait for a first byte.
            return;
        }
        self.packet[self.cycle] = byte;
        self.cycle += 1;
        if self.cycle == self.packet.len() {
            self.cycle = 0;
            self.apply();
        }
    }

    fn apply(&mut self) {
        let [flags, dx, dy] = self.packet;
        if flags & (PACKET_X_OVERFLOW | PACKET_Y_OVERFLOW) != 0 {
            return;
        }
        let delta = |raw: u8, negative: bool| {
            if negative {
                i32::from(raw) - 256
            } else {
                i32::from(raw)
            }
        };
        self.x = self.x.saturating_add(delta(dx, flags & PACKET_X_SIGN != 0)).max(0);
        // Screen y grows downwards; mouse y grows upwards.
        self.y = self.y.saturating_sub(delta(dy, flags & PACKET_Y_SIGN != 0)).max(0);
        POINTER_X.store(self.x.unsigned_abs(), Ordering::Relaxed);
        POINTER_Y.store(self.y.unsigned_abs(), Ordering::Relaxed);
    }
}

static MOUSE: Mutex<MouseState> = Mutex::new(MouseState::new());

/// Mouse IRQ: feed one packet byte.
pub fn on_mouse() {
    let byte = unsafe { inb(DATA) };
    MOUSE.lock().push(byte);
}
