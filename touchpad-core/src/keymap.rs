//! Output symbol per cell and the press event sink.
//!
//! The keypad's 1-9/C/0/B keys are routed so that the matrix reads:
//!
//! ```text
//!        x=0  x=1  x=2  x=3
//!   y=0   0    B    9    6
//!   y=1   C    8    5    3
//!   y=2   7    4    1    2
//! ```
//!
//! Indexed by `y * 4 + x`; indexes 12..15 do not exist on a 3-row matrix
//! and hold `.`.

use crate::matrix::Cell;
use crate::ByteSink;

pub const SYMBOLS: [u8; 16] = *b"0B96C8537412....";

pub fn symbol(cell: Cell) -> u8 {
    SYMBOLS[cell.index()]
}

/// Reverse lookup, for reading traces.
pub fn cell_for_symbol(symbol: u8) -> Option<Cell> {
    let index = SYMBOLS.iter().position(|&s| s == symbol && s != b'.')?;
    Cell::from_index(index)
}

/// Write the press symbol of `cell`.
pub fn emit<W: ByteSink + ?Sized>(out: &mut W, cell: Cell) {
    out.write_byte(symbol(cell));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::raster;
    use crate::testutil::Capture;

    #[test]
    fn test_symbol_table() {
        let symbols: std::vec::Vec<u8> = raster().map(symbol).collect();
        assert_eq!(symbols, b"0B96C8537412");
    }

    #[test]
    fn test_emit_writes_one_byte() {
        let mut out = Capture::default();
        emit(&mut out, Cell::new(0, 0).unwrap());
        emit(&mut out, Cell::new(3, 2).unwrap());
        assert_eq!(out.0, b"02");
    }

    #[test]
    fn test_reverse_lookup() {
        for cell in raster() {
            assert_eq!(cell_for_symbol(symbol(cell)), Some(cell));
        }
        assert_eq!(cell_for_symbol(b'.'), None);
        assert_eq!(cell_for_symbol(b'x'), None);
    }
}
