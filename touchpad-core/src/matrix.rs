//! Cell coordinates and the raster scan over the 4×3 matrix.
//!
//! Cells are visited y outer, x inner, which is also the flat index order
//! (`y * X_LINES + x`). Debug traces and the decision state both rely on
//! every cell being visited exactly once per scan in this order.

use crate::config::{NUM_CELLS, X_LINES, Y_LINES};
use crate::measure::Sensor;

/// One matrix intersection (one key).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    x: u8,
    y: u8,
}

impl Cell {
    /// Returns `None` outside the 4×3 matrix.
    pub const fn new(x: u8, y: u8) -> Option<Self> {
        if (x as usize) < X_LINES && (y as usize) < Y_LINES {
            Some(Self { x, y })
        } else {
            None
        }
    }

    pub const fn from_index(index: usize) -> Option<Self> {
        if index < NUM_CELLS {
            Some(Self {
                x: (index % X_LINES) as u8,
                y: (index / X_LINES) as u8,
            })
        } else {
            None
        }
    }

    /// Drive line, `0..4`.
    pub const fn x(self) -> u8 {
        self.x
    }

    /// Sense line, `0..3`.
    pub const fn y(self) -> u8 {
        self.y
    }

    /// Flat raster index, `y * 4 + x`.
    pub const fn index(self) -> usize {
        self.y as usize * X_LINES + self.x as usize
    }
}

/// All cells in scan order.
pub fn raster() -> impl Iterator<Item = Cell> {
    (0..Y_LINES as u8).flat_map(|y| (0..X_LINES as u8).map(move |x| Cell { x, y }))
}

/// Measure every cell once, in raster order, handing each sample to `f`
/// before the next cell is measured.
pub fn scan<S, F>(sensor: &mut S, mut f: F)
where
    S: Sensor + ?Sized,
    F: FnMut(Cell, u16),
{
    for cell in raster() {
        let v = sensor.measure(cell);
        f(cell, v);
    }
}
