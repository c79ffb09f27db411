//! Portable core of the capacitive 4×3 touch keypad.
//!
//! This crate is `no_std` so the same decision pipeline runs in the AVR
//! firmware and in the host CLI that replays captured debug traces.
//!
//! The pipeline, leaves first:
//! - [`measure`]: charge-transfer measurement of one cell over a
//!   [`measure::SenseHardware`] capability
//! - [`matrix`]: cell coordinates and the raster scan
//! - [`calibrate`]: startup baselines
//! - [`engine`]: hysteresis, debounce and baseline drift per cell
//! - [`keymap`]: cell to output symbol
//! - [`debug`]: the `debug` command matcher and trace output
//! - [`keypad`]: everything above wired into one scan cycle

#![no_std]

pub mod calibrate;
pub mod config;
pub mod debug;
pub mod engine;
pub mod keymap;
pub mod keypad;
pub mod matrix;
pub mod measure;

pub use engine::{Engine, Polarity};
pub use keypad::Keypad;
pub use matrix::Cell;
pub use measure::Sensor;

/// Blocking byte output, usually a UART.
pub trait ByteSink {
    fn write_byte(&mut self, byte: u8);

    fn write_all(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.write_byte(b);
        }
    }
}

#[cfg(test)]
extern crate std;

#[cfg(test)]
pub(crate) mod testutil {
    use std::vec::Vec;

    use crate::config::NUM_CELLS;
    use crate::{ByteSink, Cell, Sensor};

    /// Records every byte written.
    #[derive(Default)]
    pub struct Capture(pub Vec<u8>);

    impl ByteSink for Capture {
        fn write_byte(&mut self, byte: u8) {
            self.0.push(byte);
        }
    }

    /// Returns a programmable reading per cell and counts measurements.
    pub struct FixedSensor {
        pub values: [u16; NUM_CELLS],
        pub visits: Vec<Cell>,
    }

    impl FixedSensor {
        pub fn new(value: u16) -> Self {
            Self {
                values: [value; NUM_CELLS],
                visits: Vec::new(),
            }
        }
    }

    impl Sensor for FixedSensor {
        fn measure(&mut self, cell: Cell) -> u16 {
            self.visits.push(cell);
            self.values[cell.index()]
        }
    }
}
