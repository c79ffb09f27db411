//! Capacitive 4×3 touch keypad firmware for ATmega328P at 8 MHz.
//!
//! - Charge-transfer measurement per matrix cell (see `sense`)
//! - Startup calibration, then hysteresis/debounce decisions per scan
//! - One symbol byte per key press on USART0 (9600 8N1)
//! - Sending `debug` toggles a raw-value trace of every scan

#![no_std]
#![no_main]

mod sense;
mod serial;

use avr_device::atmega328p::Peripherals;

use sense::MatrixHardware;
use serial::Serial;
use touchpad_core::measure::ChargeTransfer;
use touchpad_core::{Keypad, Polarity};

/// Panic handler: on AVR we just loop forever.
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    loop {}
}

/// Main entry point.
#[no_mangle]
pub extern "C" fn main() -> ! {
    let dp = unsafe { Peripherals::steal() };

    let mut serial = Serial::new(&dp.USART0);
    serial.init();

    let mut sensor = ChargeTransfer::new(MatrixHardware::new(&dp));
    sensor.hardware().init();

    // Touch shortens the comparator capture time on this board.
    let mut keypad = Keypad::new(Polarity::Falling);
    keypad.calibrate(&mut sensor);

    loop {
        if let Some(byte) = serial.try_read() {
            keypad.poll_input(byte);
        }

        keypad.cycle(&mut sensor, &mut serial);
    }
}
