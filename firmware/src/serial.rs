//! USART0 byte stream: press symbols out, debug command in.

use avr_device::atmega328p::USART0;
use touchpad_core::ByteSink;

/// UBRR for 9600 baud at 8 MHz: F_CPU / (16 * baud) - 1.
const UBRR_9600: u16 = 51;

// UCSR0A
const RXC0: u8 = 1 << 7;
const UDRE0: u8 = 1 << 5;
// UCSR0B
const RXEN0: u8 = 1 << 4;
const TXEN0: u8 = 1 << 3;
// UCSR0C
const UCSZ01: u8 = 1 << 2;
const UCSZ00: u8 = 1 << 1;

pub struct Serial<'a> {
    usart: &'a USART0,
}

impl<'a> Serial<'a> {
    pub const fn new(usart: &'a USART0) -> Self {
        Self { usart }
    }

    /// 8 data bits, no parity, 1 stop bit; receiver and transmitter on.
    pub fn init(&mut self) {
        self.usart.ubrr0.write(|w| unsafe { w.bits(UBRR_9600) });
        self.usart
            .ucsr0c
            .write(|w| unsafe { w.bits(UCSZ01 | UCSZ00) });
        self.usart.ucsr0b.write(|w| unsafe { w.bits(RXEN0 | TXEN0) });
    }

    /// Non-blocking read of one received byte.
    pub fn try_read(&mut self) -> Option<u8> {
        if self.usart.ucsr0a.read().bits() & RXC0 == 0 {
            return None;
        }
        Some(self.usart.udr0.read().bits())
    }
}

impl ByteSink for Serial<'_> {
    fn write_byte(&mut self, byte: u8) {
        while self.usart.ucsr0a.read().bits() & UDRE0 == 0 {}
        self.usart.udr0.write(|w| unsafe { w.bits(byte) });
    }
}
