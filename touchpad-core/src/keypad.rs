//! One scan cycle of the keypad: measure, trace, decide, emit.

use crate::calibrate::calibrate;
use crate::config::NUM_CELLS;
use crate::debug::DebugChannel;
use crate::engine::{Engine, Polarity};
use crate::keymap;
use crate::matrix;
use crate::measure::Sensor;
use crate::ByteSink;

pub struct Keypad {
    engine: Engine,
    debug: DebugChannel,
}

impl Keypad {
    pub const fn new(polarity: Polarity) -> Self {
        Self {
            engine: Engine::new(polarity),
            debug: DebugChannel::new(),
        }
    }

    /// Take startup baselines. Call once, with nothing touching the pad,
    /// before the first [`Self::cycle`].
    pub fn calibrate<S: Sensor + ?Sized>(&mut self, sensor: &mut S) {
        let baseline = calibrate(sensor);
        self.engine.load_baselines(baseline);
    }

    /// Start from known baselines instead of calibrating.
    pub fn load_baselines(&mut self, baseline: [u16; NUM_CELLS]) {
        self.engine.load_baselines(baseline);
    }

    /// Scan every cell once. Press symbols (and the debug trace, when
    /// enabled) go to `out`. Returns the number of presses fired.
    pub fn cycle<S, W>(&mut self, sensor: &mut S, out: &mut W) -> u8
    where
        S: Sensor + ?Sized,
        W: ByteSink + ?Sized,
    {
        let Self { engine, debug } = self;
        let mut fired = 0u8;

        matrix::scan(sensor, |cell, v| {
            debug.write_entry(out, cell, v, engine.baseline(cell));
            if engine.update(cell, v) {
                keymap::emit(out, cell);
                fired += 1;
            }
        });
        debug.end_scan(out);

        fired
    }

    /// Feed one byte from the input stream to the debug command matcher.
    pub fn poll_input(&mut self, byte: u8) {
        self.debug.poll_input(byte);
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn debug_enabled(&self) -> bool {
        self.debug.enabled()
    }
}

#[cfg(test)]
mod tests {
    use std::vec::Vec;

    use super::*;
    use crate::matrix::Cell;
    use crate::testutil::{Capture, FixedSensor};

    #[test]
    fn test_end_to_end_press() {
        let mut sensor = FixedSensor::new(1000);
        let mut keypad = Keypad::new(Polarity::Falling);
        keypad.calibrate(&mut sensor);

        let cell0 = Cell::new(0, 0).unwrap();
        assert_eq!(keypad.engine().baseline(cell0), 16000);

        let mut out = Capture::default();
        sensor.values[0] = 500;
        assert_eq!(keypad.cycle(&mut sensor, &mut out), 0);
        assert!(out.0.is_empty());

        assert_eq!(keypad.cycle(&mut sensor, &mut out), 1);
        assert_eq!(out.0, b"0");

        for _ in 0..10 {
            keypad.cycle(&mut sensor, &mut out);
        }
        assert_eq!(out.0, b"0");
    }

    #[test]
    fn test_press_and_release_per_cell() {
        let mut sensor = FixedSensor::new(1200);
        let mut keypad = Keypad::new(Polarity::Falling);
        keypad.calibrate(&mut sensor);

        let mut out = Capture::default();
        for i in 0..NUM_CELLS {
            sensor.values[i] = 600;
            for _ in 0..4 {
                keypad.cycle(&mut sensor, &mut out);
            }
            sensor.values[i] = 1200;
            for _ in 0..2 {
                keypad.cycle(&mut sensor, &mut out);
            }
        }
        assert_eq!(out.0, b"0B96C8537412");
    }

    #[test]
    fn test_debug_trace_format() {
        let mut sensor = FixedSensor::new(1000);
        let mut keypad = Keypad::new(Polarity::Falling);
        keypad.calibrate(&mut sensor);
        for &b in b"debug" {
            keypad.poll_input(b);
        }
        assert!(keypad.debug_enabled());

        let mut out = Capture::default();
        sensor.values[1] = 500;
        keypad.cycle(&mut sensor, &mut out);
        keypad.cycle(&mut sensor, &mut out);

        let text = std::string::String::from_utf8(out.0).unwrap();
        let lines: Vec<&str> = text.split("\r\n").collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "");
        assert!(lines[0].starts_with("003e8 3e80 B01f4 3e80 9"));
        // The press symbol follows the pressed cell's entry.
        assert!(lines[1].starts_with("003e8 3e80 B01f4 3e80 B9"));
        assert_eq!(lines[0].len(), NUM_CELLS * 11);
        assert_eq!(lines[1].len(), NUM_CELLS * 11 + 1);
    }
}
