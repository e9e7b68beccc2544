use crate::ports::PortIo;
use core::fmt;

/// Base I/O port of COM1.
pub const COM1: u16 = 0x3F8;

// Register offsets from the base port.
const DATA: u16 = 0; // THR / divisor low when DLAB=1
const INT_ENABLE: u16 = 1; // IER / divisor high when DLAB=1
const FIFO_CTRL: u16 = 2;
const LINE_CTRL: u16 = 3;
const MODEM_CTRL: u16 = 4;
const LINE_STATUS: u16 = 5;

/// Line status: transmit holding register empty.
const LSR_THR_EMPTY: u8 = 1 << 5;

/// Register writes that program 115200 baud, 8N1, FIFOs on, DTR/RTS/OUT2.
const INIT_SEQUENCE: [(u16, u8); 7] = [
    (INT_ENABLE, 0x00),
    (LINE_CTRL, 0x80), // DLAB on
    (DATA, 0x01),      // divisor 1 => 115200
    (INT_ENABLE, 0x00),
    (LINE_CTRL, 0x03), // 8N1, DLAB off
    (FIFO_CTRL, 0xC7), // enable, clear both, 14-byte trigger
    (MODEM_CTRL, 0x0B),
];

/// What the diagnostic sink needs from a serial line.
pub trait SerialLine: fmt::Write {
    /// Program the line; output written before this may be lost.
    fn init(&mut self);
}

/// A polled 16550 UART.
pub struct SerialPort<P> {
    io: P,
    base: u16,
    initialized: bool,
}

impl<P: PortIo> SerialPort<P> {
    /// Wrap the UART at `base`. Does not touch hardware.
    #[must_use]
    pub const fn new(io: P, base: u16) -> Self {
        Self {
            io,
            base,
            initialized: false,
        }
    }

    /// Program the UART for 115200 baud 8N1 with FIFOs enabled.
    pub fn init(&mut self) {
        for (offset, value) in INIT_SEQUENCE {
            self.io.write(self.base + offset, value);
        }
        self.initialized = true;
    }

    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Transmit one byte, spinning until the holding register is empty.
    pub fn send(&mut self, byte: u8) {
        while self.io.read(self.base + LINE_STATUS) & LSR_THR_EMPTY == 0 {
            core::hint::spin_loop();
        }
        self.io.write(self.base + DATA, byte);
    }

    /// Transmit `s`, turning every `\n` into `\r\n`.
    pub fn send_str(&mut self, s: &str) {
        for b in s.bytes() {
            if b == b'\n' {
                self.send(b'\r');
            }
            self.send(b);
        }
    }

    /// Give back the port I/O handle.
    #[must_use]
    pub fn into_inner(self) -> P {
        self.io
    }
}

impl<P: PortIo> fmt::Write for SerialPort<P> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.send_str(s);
        Ok(())
    }
}

impl<P: PortIo> SerialLine for SerialPort<P> {
    fn init(&mut self) {
        Self::init(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        writes: Vec<(u16, u8)>,
    }

    impl PortIo for Recorder {
        fn write(&mut self, port: u16, value: u8) {
            self.writes.push((port, value));
        }

        fn read(&mut self, _port: u16) -> u8 {
            LSR_THR_EMPTY
        }
    }

    #[test]
    fn init_programs_registers_in_order() {
        let mut port = SerialPort::new(Recorder::default(), COM1);
        assert!(!port.is_initialized());
        port.init();
        assert!(port.is_initialized());
        assert_eq!(
            port.into_inner().writes,
            [
                (0x3F9, 0x00),
                (0x3FB, 0x80),
                (0x3F8, 0x01),
                (0x3F9, 0x00),
                (0x3FB, 0x03),
                (0x3FA, 0xC7),
                (0x3FC, 0x0B),
            ]
        );
    }

    #[test]
    fn honours_custom_base() {
        let mut port = SerialPort::new(Recorder::default(), 0x2F8);
        port.send(b'x');
        assert_eq!(port.into_inner().writes, [(0x2F8, b'x')]);
    }
}
