//! Transmit-path behaviour of the UART against a simulated line-status register.

use core::fmt::Write;
use kernel_serial::{COM1, PortIo, SerialPort};

const LSR: u16 = COM1 + 5;
const THRE: u8 = 0x20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    StatusRead { ready: bool },
    Data(u8),
}

/// Fake UART whose transmitter becomes ready only every `busy_polls + 1` reads.
struct SlowUart {
    busy_polls: u32,
    polls_since_write: u32,
    events: Vec<Event>,
}

impl SlowUart {
    fn new(busy_polls: u32) -> Self {
        Self {
            busy_polls,
            polls_since_write: 0,
            events: Vec::new(),
        }
    }

    fn data(&self) -> Vec<u8> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Data(b) => Some(*b),
                Event::StatusRead { .. } => None,
            })
            .collect()
    }
}

impl PortIo for SlowUart {
    fn write(&mut self, port: u16, value: u8) {
        if port == COM1 {
            self.events.push(Event::Data(value));
            self.polls_since_write = 0;
        }
    }

    fn read(&mut self, port: u16) -> u8 {
        assert_eq!(port, LSR, "only the line status register is polled");
        let ready = self.polls_since_write >= self.busy_polls;
        self.polls_since_write += 1;
        self.events.push(Event::StatusRead { ready });
        if ready { THRE } else { 0 }
    }
}

#[test]
fn every_byte_waits_for_transmitter_ready() {
    let mut port = SerialPort::new(SlowUart::new(3), COM1);
    port.write_str("ok\n").unwrap();
    let uart = port.into_inner();

    let mut last_ready = false;
    for event in &uart.events {
        match event {
            Event::StatusRead { ready } => last_ready = *ready,
            Event::Data(b) => {
                assert!(last_ready, "byte {b:#04x} written before THRE was observed");
                last_ready = false;
            }
        }
    }
    let busy = uart
        .events
        .iter()
        .filter(|e| matches!(e, Event::StatusRead { ready: false }))
        .count();
    assert_eq!(busy, 3 * 4);
}

#[test]
fn newline_is_carriage_return_then_line_feed() {
    let mut port = SerialPort::new(SlowUart::new(0), COM1);
    write!(port, "a\nb\n\n").unwrap();
    assert_eq!(port.into_inner().data(), b"a\r\nb\r\n\r\n");
}

#[test]
fn formatted_output_is_translated_too() {
    let mut port = SerialPort::new(SlowUart::new(1), COM1);
    writeln!(port, "[*] step {}", 7).unwrap();
    assert_eq!(port.into_inner().data(), b"[*] step 7\r\n");
}
