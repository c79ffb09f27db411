//! Charge-transfer measurement of a single cell.
//!
//! The X line of the cell is toggled `NUM_CYCLES` times while the Y line
//! alternates between its two pins, pumping charge into the sample
//! capacitor at a rate set by the cell's capacitance. A finger adds
//! capacitance, so the sample capacitor charges faster. Afterwards the
//! sense line is handed to the analog comparator and the timer counts until
//! it trips.
//!
//! Registers stay behind [`SenseHardware`]; everything here is portable.

use crate::config::{DELAY_CYCLES, MEASURE_TIMEOUT, NUM_CYCLES};
use crate::matrix::Cell;

/// Which half of the drive sequence to apply.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    /// X high, Y held low through its charge pin, the one the comparator
    /// later reads.
    Charge,
    /// X low, Y held low through its transfer pin.
    Transfer,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LineMode {
    /// X lines driven low, comparator and timer stopped.
    Idle,
    /// X lines floating, sense line muxed into the comparator, timer running.
    Sample,
}

/// Hardware primitives used by [`ChargeTransfer`].
pub trait SenseHardware {
    fn drive(&mut self, cell: Cell, phase: Phase);

    /// Busy-wait roughly `cycles` CPU cycles.
    fn pause(&mut self, cycles: u8);

    fn set_line_mode(&mut self, cell: Cell, mode: LineMode);

    /// Block until the comparator trips or `timeout` ticks elapse.
    /// Returns elapsed ticks, which may exceed `timeout` slightly.
    fn await_condition(&mut self, timeout: u16) -> u16;
}

/// Something that turns a cell into a raw sample.
pub trait Sensor {
    fn measure(&mut self, cell: Cell) -> u16;
}

/// The charge-transfer measurement over a [`SenseHardware`].
pub struct ChargeTransfer<H> {
    hw: H,
}

impl<H: SenseHardware> ChargeTransfer<H> {
    pub const fn new(hw: H) -> Self {
        Self { hw }
    }

    pub fn hardware(&mut self) -> &mut H {
        &mut self.hw
    }
}

impl<H: SenseHardware> Sensor for ChargeTransfer<H> {
    fn measure(&mut self, cell: Cell) -> u16 {
        for _ in 0..NUM_CYCLES {
            self.hw.drive(cell, Phase::Charge);
            self.hw.pause(DELAY_CYCLES);
            self.hw.drive(cell, Phase::Transfer);
            self.hw.pause(DELAY_CYCLES);
        }

        self.hw.set_line_mode(cell, LineMode::Sample);
        let elapsed = self.hw.await_condition(MEASURE_TIMEOUT);
        self.hw.set_line_mode(cell, LineMode::Idle);

        // A stuck comparator reads as the longest possible time: no touch.
        elapsed.min(MEASURE_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use std::vec::Vec;

    use super::*;

    #[derive(Debug, PartialEq)]
    enum Op {
        Drive(Phase),
        Pause(u8),
        Mode(LineMode),
        Await(u16),
    }

    /// Comparator that trips after `trip_after` ticks, or never.
    struct SimHardware {
        ops: Vec<Op>,
        trip_after: Option<u16>,
    }

    impl SenseHardware for SimHardware {
        fn drive(&mut self, _cell: Cell, phase: Phase) {
            self.ops.push(Op::Drive(phase));
        }

        fn pause(&mut self, cycles: u8) {
            self.ops.push(Op::Pause(cycles));
        }

        fn set_line_mode(&mut self, _cell: Cell, mode: LineMode) {
            self.ops.push(Op::Mode(mode));
        }

        fn await_condition(&mut self, timeout: u16) -> u16 {
            self.ops.push(Op::Await(timeout));
            let mut ticks = 0u16;
            loop {
                if Some(ticks) == self.trip_after || ticks >= timeout {
                    return ticks;
                }
                ticks += 1;
            }
        }
    }

    fn sensor(trip_after: Option<u16>) -> ChargeTransfer<SimHardware> {
        ChargeTransfer::new(SimHardware {
            ops: Vec::new(),
            trip_after,
        })
    }

    #[test]
    fn test_drive_sequence() {
        let mut ct = sensor(Some(700));
        let cell = Cell::new(1, 2).unwrap();
        assert_eq!(ct.measure(cell), 700);

        let ops = &ct.hardware().ops;
        let drives = NUM_CYCLES as usize * 4;
        assert_eq!(ops.len(), drives + 3);
        assert_eq!(ops[0], Op::Drive(Phase::Charge));
        assert_eq!(ops[1], Op::Pause(DELAY_CYCLES));
        assert_eq!(ops[2], Op::Drive(Phase::Transfer));
        assert_eq!(ops[3], Op::Pause(DELAY_CYCLES));
        assert_eq!(ops[drives], Op::Mode(LineMode::Sample));
        assert_eq!(ops[drives + 1], Op::Await(MEASURE_TIMEOUT));
        assert_eq!(ops[drives + 2], Op::Mode(LineMode::Idle));
    }

    #[test]
    fn test_timeout_reads_as_no_signal() {
        let mut ct = sensor(None);
        let v = ct.measure(Cell::new(0, 0).unwrap());
        assert_eq!(v, MEASURE_TIMEOUT);
    }

    #[test]
    fn test_overshoot_is_clamped() {
        struct Late;
        impl SenseHardware for Late {
            fn drive(&mut self, _: Cell, _: Phase) {}
            fn pause(&mut self, _: u8) {}
            fn set_line_mode(&mut self, _: Cell, _: LineMode) {}
            fn await_condition(&mut self, timeout: u16) -> u16 {
                timeout + 3
            }
        }

        let mut ct = ChargeTransfer::new(Late);
        assert_eq!(ct.measure(Cell::new(3, 2).unwrap()), MEASURE_TIMEOUT);
    }
}
