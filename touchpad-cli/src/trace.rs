use anyhow::{bail, Result};
use log::warn;
use touchpad_core::config::NUM_CELLS;
use touchpad_core::keymap;
use touchpad_core::Cell;

/// Bytes in one `<symbol><raw> <baseline> ` entry.
const ENTRY_LEN: usize = 11;

/// One cell's values as printed by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub cell: Cell,
    pub raw: u16,
    pub baseline: u16,
}

/// One full scan from a debug trace.
#[derive(Debug, Clone)]
pub struct ScanLine {
    /// 1-based line number in the trace.
    pub line: usize,
    pub entries: Vec<Entry>,
    /// Press symbols the device emitted during this scan.
    pub presses: Vec<Cell>,
}

impl ScanLine {
    pub fn raw(&self) -> [u16; NUM_CELLS] {
        let mut raw = [0; NUM_CELLS];
        for e in &self.entries {
            raw[e.cell.index()] = e.raw;
        }
        raw
    }

    pub fn baselines(&self) -> [u16; NUM_CELLS] {
        let mut baseline = [0; NUM_CELLS];
        for e in &self.entries {
            baseline[e.cell.index()] = e.baseline;
        }
        baseline
    }
}

/// Parse a captured debug trace.
///
/// Every non-empty line must hold all 12 entries in raster order, with press
/// symbols allowed between them. With `skip_invalid`, malformed lines (for
/// example a scan cut off at the start of a capture) are dropped with a
/// warning instead of failing the parse.
pub fn parse_trace(input: &str, skip_invalid: bool) -> Result<Vec<ScanLine>> {
    let mut lines = Vec::new();

    for (line_num, line) in input.split('\n').enumerate() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            continue;
        }

        match parse_line(line_num + 1, line.as_bytes()) {
            Ok(scan) => lines.push(scan),
            Err(e) if skip_invalid => warn!("skipping: {:#}", e),
            Err(e) => return Err(e),
        }
    }

    Ok(lines)
}

fn parse_line(line_num: usize, bytes: &[u8]) -> Result<ScanLine> {
    let mut entries = Vec::with_capacity(NUM_CELLS);
    let mut presses = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if let Some(entry) = parse_entry(&bytes[i..]) {
            let Some(expected) = Cell::from_index(entries.len()) else {
                bail!("line {}: more than {} entries", line_num, NUM_CELLS);
            };
            if entry.cell != expected {
                bail!(
                    "line {}: entry '{}' out of scan order, expected '{}'",
                    line_num,
                    keymap::symbol(entry.cell) as char,
                    keymap::symbol(expected) as char
                );
            }
            entries.push(entry);
            i += ENTRY_LEN;
        } else if let Some(cell) = keymap::cell_for_symbol(bytes[i]) {
            presses.push(cell);
            i += 1;
        } else {
            bail!(
                "line {}: unexpected byte 0x{:02X} at column {}",
                line_num,
                bytes[i],
                i + 1
            );
        }
    }

    if entries.len() != NUM_CELLS {
        bail!(
            "line {}: expected {} entries, got {}",
            line_num,
            NUM_CELLS,
            entries.len()
        );
    }

    Ok(ScanLine {
        line: line_num,
        entries,
        presses,
    })
}

fn parse_entry(bytes: &[u8]) -> Option<Entry> {
    if bytes.len() < ENTRY_LEN || bytes[5] != b' ' || bytes[10] != b' ' {
        return None;
    }
    let cell = keymap::cell_for_symbol(bytes[0])?;
    let raw = parse_hex_u16(&bytes[1..5])?;
    let baseline = parse_hex_u16(&bytes[6..10])?;
    Some(Entry { cell, raw, baseline })
}

fn parse_hex_u16(digits: &[u8]) -> Option<u16> {
    let s = std::str::from_utf8(digits).ok()?;
    if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u16::from_str_radix(s, 16).ok()
}
