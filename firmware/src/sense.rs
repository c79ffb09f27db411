//! Register-level charge-transfer hardware for the keypad matrix.
//!
//! Pin mapping (ATmega328P):
//!   X drive lines:      PB0-PB3
//!   Y charge pins:      PC1, PC2, PC5 (also ADC1, ADC2, ADC5 into the comparator)
//!   Y transfer pins:    PC0, PC3, PC4
//!   Sample pin:         PD7
//!
//! The analog comparator's output is routed to Timer1 input capture, so the
//! capture register holds the tick count at which the sample capacitor
//! crossed the comparator threshold. The capture flag is polled against a
//! tick deadline instead of waiting on the capture interrupt.

use avr_device::atmega328p::Peripherals;
use touchpad_core::measure::{LineMode, Phase, SenseHardware};
use touchpad_core::Cell;

const X_MASK: u8 = 0x0F;

/// Y pin bits, indexed by y: (charge pin, transfer pin).
const Y_PINS: [(u8, u8); 3] = [
    (1 << 1, 1 << 0),
    (1 << 2, 1 << 3),
    (1 << 5, 1 << 4),
];

/// ADMUX channel of each Y charge pin.
const Y_MUX: [u8; 3] = [1, 2, 5];

// PCn is ADCn, so the comparator must watch the pin the Charge phase holds.
const _: () = {
    let mut y = 0;
    while y < Y_PINS.len() {
        assert!(1 << Y_MUX[y] == Y_PINS[y].0);
        assert!(Y_PINS[y].0 & Y_PINS[y].1 == 0);
        y += 1;
    }
};

const SMP: u8 = 1 << 7;

// Register bits
const ACME: u8 = 1 << 6; // ADCSRB
const ADEN: u8 = 1 << 7; // ADCSRA
const ACIC: u8 = 1 << 2; // ACSR
const ICNC1: u8 = 1 << 7; // TCCR1B
const CS10: u8 = 1 << 0; // TCCR1B
const ICF1: u8 = 1 << 5; // TIFR1

pub struct MatrixHardware<'a> {
    dp: &'a Peripherals,
}

impl<'a> MatrixHardware<'a> {
    pub const fn new(dp: &'a Peripherals) -> Self {
        Self { dp }
    }

    /// Ports to their idle state and the comparator wired to Timer1 capture.
    pub fn init(&mut self) {
        let dp = self.dp;

        // Drive the X lines low by default to reduce noise.
        dp.PORTB.ddrb.write(|w| unsafe { w.bits(X_MASK) });
        dp.PORTB.portb.write(|w| unsafe { w.bits(0) });
        dp.PORTC.ddrc.write(|w| unsafe { w.bits(0) });
        dp.PORTC.portc.write(|w| unsafe { w.bits(0) });
        dp.PORTD.ddrd.write(|w| unsafe { w.bits(0) });
        dp.PORTD.portd.write(|w| unsafe { w.bits(0) });

        dp.AC.acsr.write(|w| unsafe { w.bits(0) });
        dp.ADC.adcsrb.write(|w| unsafe { w.bits(ACME) });
        dp.ADC
            .adcsra
            .modify(|r, w| unsafe { w.bits(r.bits() & !ADEN) });
        dp.AC.acsr.write(|w| unsafe { w.bits(ACIC) });

        dp.TC1.tccr1a.write(|w| unsafe { w.bits(0) });
        dp.TC1.tccr1c.write(|w| unsafe { w.bits(0) });
        // Noise canceler on, clock stopped.
        dp.TC1.tccr1b.write(|w| unsafe { w.bits(ICNC1) });
        dp.TC1.timsk1.write(|w| unsafe { w.bits(0) });
    }
}

impl SenseHardware for MatrixHardware<'_> {
    #[inline(always)]
    fn drive(&mut self, cell: Cell, phase: Phase) {
        let (charge, transfer) = Y_PINS[cell.y() as usize];
        let (y_dir, x_out) = match phase {
            Phase::Charge => (charge, 1u8 << cell.x()),
            Phase::Transfer => (transfer, 0),
        };

        let dp = self.dp;
        dp.PORTC.ddrc.write(|w| unsafe { w.bits(0) });
        dp.PORTC.ddrc.write(|w| unsafe { w.bits(y_dir) });
        dp.PORTB.portb.write(|w| unsafe { w.bits(x_out) });
    }

    #[inline(always)]
    fn pause(&mut self, cycles: u8) {
        avr_device::asm::delay_cycles(cycles.into());
    }

    fn set_line_mode(&mut self, cell: Cell, mode: LineMode) {
        let dp = self.dp;
        match mode {
            LineMode::Sample => {
                dp.PORTB.ddrb.write(|w| unsafe { w.bits(0) });
                dp.ADC
                    .admux
                    .write(|w| unsafe { w.bits(Y_MUX[cell.y() as usize]) });
                dp.ADC.adcsrb.write(|w| unsafe { w.bits(ACME) });
                dp.TC1.tcnt1.write(|w| unsafe { w.bits(0) });
                dp.TC1.tccr1b.write(|w| unsafe { w.bits(ICNC1 | CS10) });
                // Writing one clears the flag.
                dp.TC1.tifr1.write(|w| unsafe { w.bits(ICF1) });
                dp.PORTD.portd.write(|w| unsafe { w.bits(SMP) });
                dp.PORTD.ddrd.write(|w| unsafe { w.bits(SMP) });
            }
            LineMode::Idle => {
                dp.TC1.tccr1b.write(|w| unsafe { w.bits(ICNC1) });
                dp.PORTD.portd.write(|w| unsafe { w.bits(0) });
                dp.PORTD.ddrd.write(|w| unsafe { w.bits(0) });
                dp.ADC.adcsrb.write(|w| unsafe { w.bits(0) });
                dp.PORTB.ddrb.write(|w| unsafe { w.bits(X_MASK) });
            }
        }
    }

    fn await_condition(&mut self, timeout: u16) -> u16 {
        let tc1 = &self.dp.TC1;
        loop {
            if tc1.tifr1.read().bits() & ICF1 != 0 {
                return tc1.icr1.read().bits();
            }
            let now = tc1.tcnt1.read().bits();
            if now >= timeout {
                return now;
            }
        }
    }
}
