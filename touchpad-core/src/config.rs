//! Compile-time parameters of the sensing pipeline.

/// Number of drive (X) lines.
pub const X_LINES: usize = 4;
/// Number of sense (Y) lines.
pub const Y_LINES: usize = 3;
/// Total number of matrix cells.
pub const NUM_CELLS: usize = X_LINES * Y_LINES;

/// Charge/transfer repetitions per measurement.
pub const NUM_CYCLES: u16 = 150;
/// Busy-wait cycles between the two drive phases.
pub const DELAY_CYCLES: u8 = 5;
/// Upper bound in timer ticks on the comparator wait.
///
/// Keeps `16 * timeout` inside a `u16` baseline.
pub const MEASURE_TIMEOUT: u16 = 4000;

/// Full-matrix scans summed into each baseline at startup.
pub const CALIBRATION_ROUNDS: u8 = 16;
/// Consecutive touched cycles before a press fires.
pub const SUSTAINED_SIGNAL_COUNT: u8 = 2;
/// Press counter above which the baseline re-tracks a held key.
pub const HELD_DRIFT_COUNT: u8 = 100;

/// Input command that toggles debug output.
pub const DEBUG_COMMAND: &[u8] = b"debug";
