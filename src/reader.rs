//! Buffered reader with high/low-water flow control (spec §4.8, §3
//! "Reader buffer"). Pure buffer management: the connection task is
//! responsible for actually pausing/resuming the transport in response
//! to the `FlowControl` hints this returns, and for re-polling a
//! `try_*` method once more bytes arrive.

use bytes::BytesMut;
use regex::bytes::Regex;

use crate::error::{Result, TelnetError};

/// A flow-control instruction for the transport, raised at the moment
/// the buffer crosses a threshold (not on every call).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FlowControl {
    Pause,
    Resume,
    Unchanged,
}

/// Ordered byte buffer accumulated from the transport, with a size
/// limit `L`, a high-water threshold at `0.75 * L`, and a low-water
/// threshold at `0.25 * L`.
pub struct Reader {
    buffer: BytesMut,
    limit: usize,
    eof: bool,
    paused: bool,
}

impl Reader {
    pub fn new(limit: usize) -> Self {
        Reader { buffer: BytesMut::new(), limit, eof: false, paused: false }
    }

    pub fn high_water(&self) -> usize {
        self.limit * 3 / 4
    }

    pub fn low_water(&self) -> usize {
        self.limit / 4
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Appends transport bytes, returning `Pause` the moment the buffer
    /// first crosses the high-water mark.
    pub fn push(&mut self, data: &[u8]) -> FlowControl {
        self.buffer.extend_from_slice(data);
        if !self.paused && self.buffer.len() >= self.high_water() {
            self.paused = true;
            FlowControl::Pause
        } else {
            FlowControl::Unchanged
        }
    }

    pub fn mark_eof(&mut self) {
        self.eof = true;
    }

    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Called after consuming bytes from the buffer; returns `Resume`
    /// the moment the buffer first falls below the low-water mark.
    fn flow_after_consume(&mut self) -> FlowControl {
        if self.paused && self.buffer.len() <= self.low_water() {
            self.paused = false;
            FlowControl::Resume
        } else {
            FlowControl::Unchanged
        }
    }

    /// `read(n)`: returns up to `n` bytes (or all buffered bytes when
    /// `n` is `None`). `None` means the caller must suspend until more
    /// bytes arrive or EOF; `Some` with an empty vec signals EOF with
    /// nothing left to deliver.
    pub fn read(&mut self, n: Option<usize>) -> Option<(Vec<u8>, FlowControl)> {
        if self.buffer.is_empty() {
            return if self.eof { Some((Vec::new(), FlowControl::Unchanged)) } else { None };
        }

        let take = n.map(|n| n.min(self.buffer.len())).unwrap_or(self.buffer.len());
        let data = self.buffer.split_to(take).to_vec();
        Some((data, self.flow_after_consume()))
    }

    /// `readline()`: bytes through the next `\n`, inclusive. On EOF with
    /// no newline, returns whatever remains buffered, then an empty
    /// read. Never fails — a dangling line at EOF is not an error.
    pub fn try_readline(&mut self) -> Option<(Vec<u8>, FlowControl)> {
        if let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line = self.buffer.split_to(pos + 1).to_vec();
            return Some((line, self.flow_after_consume()));
        }

        if self.eof {
            if self.buffer.is_empty() {
                Some((Vec::new(), FlowControl::Unchanged))
            } else {
                let len = self.buffer.len();
                let rest = self.buffer.split_to(len).to_vec();
                Some((rest, self.flow_after_consume()))
            }
        } else {
            None
        }
    }

    /// `readuntil(needle)`: bytes through the next occurrence of
    /// `needle`, inclusive.
    pub fn try_readuntil(&mut self, needle: &[u8]) -> Result<Option<(Vec<u8>, FlowControl)>> {
        if let Some(pos) = find_subslice(&self.buffer, needle) {
            let end = pos + needle.len();
            let data = self.buffer.split_to(end).to_vec();
            return Ok(Some((data, self.flow_after_consume())));
        }

        self.fail_if_exhausted()
    }

    /// `readuntil_pattern(regex)`: bytes through the end of the first
    /// regex match.
    pub fn try_readuntil_pattern(
        &mut self,
        pattern: &Regex,
    ) -> Result<Option<(Vec<u8>, FlowControl)>> {
        if let Some(m) = pattern.find(&self.buffer) {
            let end = m.end();
            let data = self.buffer.split_to(end).to_vec();
            return Ok(Some((data, self.flow_after_consume())));
        }

        self.fail_if_exhausted()
    }

    fn fail_if_exhausted(&mut self) -> Result<Option<(Vec<u8>, FlowControl)>> {
        if self.buffer.len() > self.limit {
            let consumed = self.buffer.len();
            self.buffer.clear();
            self.paused = false;
            return Err(TelnetError::LimitOverrun(consumed));
        }

        if self.eof {
            let len = self.buffer.len();
            let data = self.buffer.split_to(len).to_vec();
            return Err(TelnetError::IncompleteRead(data));
        }

        Ok(None)
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_returns_none_until_bytes_arrive() {
        let mut reader = Reader::new(16);
        assert!(reader.read(None).is_none());
        reader.push(b"hi");
        assert_eq!(reader.read(None), Some((b"hi".to_vec(), FlowControl::Unchanged)));
    }

    #[test]
    fn readline_waits_for_newline_then_returns_through_it() {
        let mut reader = Reader::new(64);
        reader.push(b"partial");
        assert!(reader.try_readline().is_none());
        reader.push(b" line\nnext");
        assert_eq!(reader.try_readline(), Some((b"partial line\n".to_vec(), FlowControl::Unchanged)));
        assert_eq!(reader.len(), 4); // "next" left buffered
    }

    #[test]
    fn readline_at_eof_drains_remainder_then_reports_empty() {
        let mut reader = Reader::new(64);
        reader.push(b"no newline");
        reader.mark_eof();
        assert_eq!(
            reader.try_readline(),
            Some((b"no newline".to_vec(), FlowControl::Unchanged))
        );
        assert_eq!(reader.try_readline(), Some((Vec::new(), FlowControl::Unchanged)));
    }

    #[test]
    fn readuntil_reports_incomplete_read_on_eof_before_match() {
        let mut reader = Reader::new(64);
        reader.push(b"no terminator here");
        reader.mark_eof();
        match reader.try_readuntil(b"###") {
            Err(TelnetError::IncompleteRead(buffered)) => {
                assert_eq!(buffered, b"no terminator here");
            }
            other => panic!("expected IncompleteRead, got {other:?}"),
        }
    }

    #[test]
    fn readuntil_reports_limit_overrun_before_match() {
        let mut reader = Reader::new(8);
        reader.push(b"more than eight bytes of data");
        match reader.try_readuntil(b"###") {
            Err(TelnetError::LimitOverrun(n)) => assert_eq!(n, 29),
            other => panic!("expected LimitOverrun, got {other:?}"),
        }
    }

    #[test]
    fn push_signals_pause_once_crossing_high_water_and_resume_after_drain() {
        let mut reader = Reader::new(100); // high=75, low=25
        assert_eq!(reader.push(&vec![0u8; 80]), FlowControl::Pause);
        assert_eq!(reader.push(&vec![0u8; 5]), FlowControl::Unchanged);
        // Draining down to 15 buffered bytes crosses the low-water mark.
        let (_, flow) = reader.read(Some(70)).unwrap();
        assert_eq!(flow, FlowControl::Resume);
        let (_, flow) = reader.read(Some(0)).unwrap();
        assert_eq!(flow, FlowControl::Unchanged);
    }

    #[test]
    fn readuntil_pattern_matches_byte_regex() {
        let mut reader = Reader::new(64);
        reader.push(b"name: bob\r\n");
        let pattern = Regex::new(r"\r\n").unwrap();
        let (data, _) = reader.try_readuntil_pattern(&pattern).unwrap().unwrap();
        assert_eq!(data, b"name: bob\r\n");
    }
}
