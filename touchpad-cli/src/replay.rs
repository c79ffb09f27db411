//! Run captured raw samples back through the decision engine.

use anyhow::{bail, Result};
use indicatif::ProgressBar;
use log::debug;
use touchpad_core::config::{CALIBRATION_ROUNDS, NUM_CELLS};
use touchpad_core::{keymap, ByteSink, Cell, Keypad, Polarity, Sensor};

use crate::trace::ScanLine;

/// Where the starting baselines come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Start {
    /// Use the baselines the device printed on the first line.
    TraceBaselines,
    /// Calibrate from the first 16 scans, as the device does at power-up.
    Calibrate,
}

/// A press seen at a given trace line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Press {
    pub line: usize,
    pub cell: Cell,
}

#[derive(Debug, Default)]
pub struct Report {
    /// Scans fed to the decision loop (calibration scans excluded).
    pub scans: usize,
    pub detected: Vec<Press>,
    pub recorded: Vec<Press>,
    /// Scans whose printed baselines differ from the replayed engine's.
    pub baseline_mismatches: usize,
}

impl Report {
    pub fn matches(&self) -> bool {
        self.detected == self.recorded
    }
}

/// Replays trace lines as if measured, one full scan per line.
struct TraceSensor<'a> {
    lines: &'a [ScanLine],
    pos: usize,
    current: [u16; NUM_CELLS],
}

impl Sensor for TraceSensor<'_> {
    fn measure(&mut self, cell: Cell) -> u16 {
        if cell.index() == 0 {
            self.current = self.lines[self.pos].raw();
            self.pos += 1;
        }
        self.current[cell.index()]
    }
}

#[derive(Default)]
struct Symbols(Vec<u8>);

impl ByteSink for Symbols {
    fn write_byte(&mut self, byte: u8) {
        self.0.push(byte);
    }
}

pub fn replay(
    lines: &[ScanLine],
    polarity: Polarity,
    start: Start,
    pb: &ProgressBar,
) -> Result<Report> {
    let Some(first) = lines.first() else {
        bail!("trace has no scan lines");
    };

    let mut keypad = Keypad::new(polarity);
    let mut sensor = TraceSensor {
        lines,
        pos: 0,
        current: [0; NUM_CELLS],
    };

    match start {
        Start::TraceBaselines => keypad.load_baselines(first.baselines()),
        Start::Calibrate => {
            if lines.len() <= CALIBRATION_ROUNDS as usize {
                bail!(
                    "need more than {} scans to calibrate, trace has {}",
                    CALIBRATION_ROUNDS,
                    lines.len()
                );
            }
            keypad.calibrate(&mut sensor);
            pb.inc(CALIBRATION_ROUNDS as u64);
        }
    }

    let mut report = Report::default();
    let mut out = Symbols::default();

    for scan in &lines[sensor.pos..] {
        if *keypad.engine().baselines() != scan.baselines() {
            report.baseline_mismatches += 1;
        }
        report.recorded.extend(scan.presses.iter().map(|&cell| Press {
            line: scan.line,
            cell,
        }));

        keypad.cycle(&mut sensor, &mut out);
        for byte in out.0.drain(..) {
            if let Some(cell) = keymap::cell_for_symbol(byte) {
                debug!("line {}: press '{}'", scan.line, byte as char);
                report.detected.push(Press {
                    line: scan.line,
                    cell,
                });
            }
        }

        report.scans += 1;
        pb.inc(1);
    }

    Ok(report)
}
