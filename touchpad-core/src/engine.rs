//! Per-cell touch decision: hysteresis, debounce and baseline drift.
//!
//! Each cell keeps a baseline (16× the untouched average, so the
//! exponential update stays exact in integer shifts) and a press counter.
//!
//! Counter states:
//! - `0`: idle
//! - `1`: debouncing
//! - `2..=100`: pressed, the press event fired on reaching `2`
//! - `101`: held long enough that the baseline re-tracks the held reading
//!
//! Entering "touched" uses a stricter threshold than staying touched, so a
//! reading hovering near one threshold cannot toggle the cell every scan.

use log::debug;

use crate::config::{HELD_DRIFT_COUNT, NUM_CELLS, SUSTAINED_SIGNAL_COUNT};
use crate::matrix::Cell;

/// Direction a touch moves the raw sample.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Polarity {
    /// Touch lowers the reading (comparator capture time).
    #[default]
    Falling,
    /// Touch raises the reading.
    Rising,
}

impl Polarity {
    /// Threshold to go from no signal to signal.
    pub const fn signal_threshold(self, baseline: u16) -> u16 {
        match self {
            Polarity::Falling => (baseline >> 4).wrapping_sub(baseline >> 9),
            Polarity::Rising => (baseline >> 4).wrapping_add(baseline >> 9),
        }
    }

    /// Threshold to go from signal back to no signal. Looser than
    /// [`Self::signal_threshold`].
    pub const fn no_signal_threshold(self, baseline: u16) -> u16 {
        match self {
            Polarity::Falling => (baseline >> 4).wrapping_sub(baseline >> 10),
            Polarity::Rising => (baseline >> 4).wrapping_add(baseline >> 10),
        }
    }

    /// True when `v` is on the touched side of `threshold`.
    pub const fn beyond(self, v: u16, threshold: u16) -> bool {
        match self {
            Polarity::Falling => v < threshold,
            Polarity::Rising => v > threshold,
        }
    }
}

/// Decoded baseline average.
pub const fn baseline_avg(baseline: u16) -> u16 {
    baseline >> 4
}

/// First-order moving average with gain 1/16, in ×16 units.
pub const fn rebase(baseline: u16, v: u16) -> u16 {
    baseline.wrapping_add(v.wrapping_sub(baseline_avg(baseline)))
}

pub struct Engine {
    polarity: Polarity,
    baseline: [u16; NUM_CELLS],
    pressed: [u8; NUM_CELLS],
}

impl Engine {
    pub const fn new(polarity: Polarity) -> Self {
        Self {
            polarity,
            baseline: [0; NUM_CELLS],
            pressed: [0; NUM_CELLS],
        }
    }

    /// Install calibrated baselines and clear every press counter.
    pub fn load_baselines(&mut self, baseline: [u16; NUM_CELLS]) {
        self.baseline = baseline;
        self.pressed = [0; NUM_CELLS];
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    pub fn baseline(&self, cell: Cell) -> u16 {
        self.baseline[cell.index()]
    }

    pub fn press_count(&self, cell: Cell) -> u8 {
        self.pressed[cell.index()]
    }

    pub fn baselines(&self) -> &[u16; NUM_CELLS] {
        &self.baseline
    }

    /// Feed one raw sample for `cell`. Returns `true` exactly once per
    /// press, on the scan where the counter reaches the debounce count.
    pub fn update(&mut self, cell: Cell, v: u16) -> bool {
        let i = cell.index();
        let b = &mut self.baseline[i];
        let p = &mut self.pressed[i];
        let pol = self.polarity;

        if *p != 0 && pol.beyond(v, pol.no_signal_threshold(*b)) {
            if *p > HELD_DRIFT_COUNT {
                *b = rebase(*b, v);
            } else {
                *p += 1;
            }
        } else if *p == 0 && pol.beyond(v, pol.signal_threshold(*b)) {
            *p += 1;
        } else {
            *p = 0;
            *b = rebase(*b, v);
        }

        let fired = *p == SUSTAINED_SIGNAL_COUNT;
        if fired {
            debug!("press x={} y={} v={} avg={}", cell.x(), cell.y(), v, baseline_avg(*b));
        }
        fired
    }
}
