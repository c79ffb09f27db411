//! Debug channel: the `debug` command matcher and the per-scan trace.
//!
//! While enabled, every cell writes `<symbol><raw> <baseline> ` (16-bit
//! values as four lowercase hex digits) before its decision is taken, and
//! each scan ends with `\r\n`. A press symbol fired by a cell therefore
//! lands right after that cell's entry.

use log::trace;

use crate::config::DEBUG_COMMAND;
use crate::keymap;
use crate::matrix::Cell;
use crate::ByteSink;

const HEX: &[u8; 16] = b"0123456789abcdef";

/// Byte-by-byte matcher for a fixed command.
pub struct CommandMatcher {
    command: &'static [u8],
    pos: usize,
}

impl CommandMatcher {
    pub const fn new(command: &'static [u8]) -> Self {
        Self { command, pos: 0 }
    }

    /// Returns `true` when `byte` completes the command.
    pub fn feed(&mut self, byte: u8) -> bool {
        if self.command.is_empty() {
            return false;
        }
        if byte != self.command[self.pos] {
            self.pos = 0;
        }
        if byte == self.command[self.pos] {
            self.pos += 1;
            if self.pos == self.command.len() {
                self.pos = 0;
                return true;
            }
        }
        false
    }
}

pub struct DebugChannel {
    matcher: CommandMatcher,
    enabled: bool,
}

impl DebugChannel {
    pub const fn new() -> Self {
        Self {
            matcher: CommandMatcher::new(DEBUG_COMMAND),
            enabled: false,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Feed one input byte; toggles the channel on a full command match.
    pub fn poll_input(&mut self, byte: u8) {
        if self.matcher.feed(byte) {
            self.enabled = !self.enabled;
            trace!("debug output {}", if self.enabled { "on" } else { "off" });
        }
    }

    pub fn write_entry<W>(&self, out: &mut W, cell: Cell, v: u16, baseline: u16)
    where
        W: ByteSink + ?Sized,
    {
        if !self.enabled {
            return;
        }
        keymap::emit(out, cell);
        write_hex_u16(out, v);
        write_hex_u16(out, baseline);
    }

    pub fn end_scan<W: ByteSink + ?Sized>(&self, out: &mut W) {
        if self.enabled {
            out.write_all(b"\r\n");
        }
    }
}

impl Default for DebugChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Four hex digits followed by a space.
pub fn write_hex_u16<W: ByteSink + ?Sized>(out: &mut W, n: u16) {
    for shift in [12, 8, 4, 0] {
        out.write_byte(HEX[((n >> shift) & 0xf) as usize]);
    }
    out.write_byte(b' ');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::Capture;

    fn feed_all(ch: &mut DebugChannel, input: &[u8]) {
        for &b in input {
            ch.poll_input(b);
        }
    }

    #[test]
    fn test_hex() {
        let mut out = Capture::default();
        write_hex_u16(&mut out, 0x3e80);
        write_hex_u16(&mut out, 0x01f4);
        write_hex_u16(&mut out, 0xffff);
        assert_eq!(out.0, b"3e80 01f4 ffff ");
    }

    #[test]
    fn test_toggle() {
        let mut ch = DebugChannel::new();
        assert!(!ch.enabled());
        feed_all(&mut ch, b"debug");
        assert!(ch.enabled());
        feed_all(&mut ch, b"debug");
        assert!(!ch.enabled());
    }

    #[test]
    fn test_mismatch_restarts() {
        let mut ch = DebugChannel::new();
        feed_all(&mut ch, b"debxg");
        assert!(!ch.enabled());
        // A mismatching 'd' starts a fresh match.
        feed_all(&mut ch, b"deddebug");
        assert!(ch.enabled());
        feed_all(&mut ch, b"\r\nxx debu");
        assert!(ch.enabled());
        feed_all(&mut ch, b"g");
        assert!(!ch.enabled());
    }

    #[test]
    fn test_entry_only_when_enabled() {
        let cell = Cell::new(1, 0).unwrap();
        let mut ch = DebugChannel::new();
        let mut out = Capture::default();

        ch.write_entry(&mut out, cell, 500, 16000);
        ch.end_scan(&mut out);
        assert!(out.0.is_empty());

        ch.set_enabled(true);
        ch.write_entry(&mut out, cell, 500, 16000);
        ch.end_scan(&mut out);
        assert_eq!(out.0, b"B01f4 3e80 \r\n");
    }
}
