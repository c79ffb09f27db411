//! Startup baselines.
//!
//! Sums `CALIBRATION_ROUNDS` full scans per cell without dividing: with 16
//! rounds the sum is already the ×16 average the engine works in. The
//! keypad must be untouched while this runs; nothing checks that.

use log::debug;

use crate::config::{CALIBRATION_ROUNDS, NUM_CELLS};
use crate::matrix;
use crate::measure::Sensor;

pub fn calibrate<S: Sensor + ?Sized>(sensor: &mut S) -> [u16; NUM_CELLS] {
    let mut baseline = [0u16; NUM_CELLS];

    for _ in 0..CALIBRATION_ROUNDS {
        matrix::scan(sensor, |cell, v| {
            let b = &mut baseline[cell.index()];
            *b = b.wrapping_add(v);
        });
    }

    debug!("calibrated baselines {:?}", baseline);
    baseline
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Cell;
    use crate::testutil::FixedSensor;

    #[test]
    fn test_identical_samples() {
        let mut sensor = FixedSensor::new(1000);
        sensor.values[5] = 37;
        sensor.values[11] = 4000;

        let baseline = calibrate(&mut sensor);

        for (i, &b) in baseline.iter().enumerate() {
            assert_eq!(b, sensor.values[i] * 16, "cell {}", i);
        }
        assert_eq!(sensor.visits.len(), NUM_CELLS * CALIBRATION_ROUNDS as usize);
    }

    #[test]
    fn test_varying_samples_sum() {
        struct Ramp(u16);
        impl Sensor for Ramp {
            fn measure(&mut self, cell: Cell) -> u16 {
                if cell.index() == 0 {
                    self.0 += 1;
                }
                self.0 + cell.index() as u16
            }
        }

        let baseline = calibrate(&mut Ramp(0));
        // Rounds read 1..=16 on cell 0.
        assert_eq!(baseline[0], 136);
        assert_eq!(baseline[3], 136 + 3 * 16);
    }
}
