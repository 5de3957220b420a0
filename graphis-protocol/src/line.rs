//! Input accumulation for `;`-terminated commands.
//!
//! Bytes arrive in arbitrary chunks; a command may be split over several
//! reads and one read may carry several commands. The buffer keeps any
//! unterminated tail until the rest of it arrives.

use core::fmt;

use heapless::Vec;

use crate::command::trim_ascii;

/// Command terminator
pub const TERMINATOR: u8 = b';';

/// Errors raised by the line buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineError {
    /// Buffer filled up without a terminator; pending bytes were dropped
    Overflow,
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineError::Overflow => f.write_str("line too long"),
        }
    }
}

/// Fixed-capacity byte accumulator that yields terminated command segments
#[derive(Debug, Clone, Default)]
pub struct LineBuffer<const N: usize> {
    buf: Vec<u8, N>,
    /// Dropping the tail of an overlong command up to its terminator
    discarding: bool,
}

impl<const N: usize> LineBuffer<N> {
    /// Create an empty buffer
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            discarding: false,
        }
    }

    /// Append as many bytes as fit
    ///
    /// Returns the number of bytes consumed. After an overflow, bytes up to
    /// and including the next terminator are consumed but not stored.
    pub fn push_bytes(&mut self, mut bytes: &[u8]) -> usize {
        let mut skipped = 0;
        if self.discarding {
            match bytes.iter().position(|&b| b == TERMINATOR) {
                Some(end) => {
                    self.discarding = false;
                    skipped = end + 1;
                    bytes = &bytes[skipped..];
                }
                None => return bytes.len(),
            }
        }

        let take = bytes.len().min(self.free());
        // Cannot fail, `take` is bounded by the free space
        let _ = self.buf.extend_from_slice(&bytes[..take]);
        skipped + take
    }

    /// Free space in bytes
    pub fn free(&self) -> usize {
        N - self.buf.len()
    }

    /// Number of buffered bytes (terminated or not)
    pub fn pending_len(&self) -> usize {
        self.buf.len()
    }

    /// True if nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// True if the buffer cannot take another byte
    pub fn is_full(&self) -> bool {
        self.buf.is_full()
    }

    /// True if the buffered bytes are all whitespace
    ///
    /// Line endings left behind after the last terminator land here; they
    /// are not a partial command.
    pub fn is_blank(&self) -> bool {
        self.buf.iter().all(|b| b.is_ascii_whitespace())
    }

    /// True if at least one terminator is buffered
    pub fn has_complete(&self) -> bool {
        self.buf.contains(&TERMINATOR)
    }

    /// Pop the next terminated, non-empty command segment
    ///
    /// Segments are returned in arrival order with surrounding whitespace
    /// removed. Empty segments (`;;`, stray newlines) are skipped.
    pub fn next_command(&mut self) -> Option<Vec<u8, N>> {
        loop {
            let end = self.buf.iter().position(|&b| b == TERMINATOR)?;

            let mut segment = Vec::new();
            // Cannot fail, the segment is shorter than the buffer
            let _ = segment.extend_from_slice(trim_ascii(&self.buf[..end]));
            self.consume(end + 1);

            if !segment.is_empty() {
                return Some(segment);
            }
        }
    }

    /// Detect a full buffer that can never complete
    ///
    /// If the buffer is full and holds no terminator the pending bytes are
    /// discarded, the rest of the command is skipped as it arrives and
    /// `Overflow` is returned so the caller can report it.
    pub fn check_overflow(&mut self) -> Result<(), LineError> {
        if self.is_full() && !self.has_complete() {
            self.buf.clear();
            self.discarding = true;
            return Err(LineError::Overflow);
        }
        Ok(())
    }

    /// Drop everything buffered
    pub fn clear(&mut self) {
        self.buf.clear();
        self.discarding = false;
    }

    /// Remove the first `count` bytes
    fn consume(&mut self, count: usize) {
        let len = self.buf.len();
        self.buf.copy_within(count..len, 0);
        self.buf.truncate(len - count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_command() {
        let mut line = LineBuffer::<64>::new();
        line.push_bytes(b"t0=10;");
        assert!(line.has_complete());
        assert_eq!(line.next_command().unwrap().as_slice(), b"t0=10");
        assert!(line.next_command().is_none());
        assert!(line.is_empty());
    }

    #[test]
    fn test_multiple_commands_in_order() {
        let mut line = LineBuffer::<64>::new();
        line.push_bytes(b"s0=1500;t1=200;i2?;");
        assert_eq!(line.next_command().unwrap().as_slice(), b"s0=1500");
        assert_eq!(line.next_command().unwrap().as_slice(), b"t1=200");
        assert_eq!(line.next_command().unwrap().as_slice(), b"i2?");
        assert!(line.next_command().is_none());
    }

    #[test]
    fn test_partial_command_kept() {
        let mut line = LineBuffer::<64>::new();
        line.push_bytes(b"t0=1;t1=2");
        assert_eq!(line.next_command().unwrap().as_slice(), b"t0=1");
        assert!(line.next_command().is_none());
        assert_eq!(line.pending_len(), 4);
        assert!(!line.is_blank());

        line.push_bytes(b"00;");
        assert_eq!(line.next_command().unwrap().as_slice(), b"t1=200");
    }

    #[test]
    fn test_empty_segments_skipped() {
        let mut line = LineBuffer::<64>::new();
        line.push_bytes(b";; \r\n;t0=5;\n");
        assert_eq!(line.next_command().unwrap().as_slice(), b"t0=5");
        assert!(line.next_command().is_none());
        // Trailing newline stays as pending (harmless) input
        assert_eq!(line.pending_len(), 1);
        assert!(line.is_blank());
    }

    #[test]
    fn test_push_respects_capacity() {
        let mut line = LineBuffer::<8>::new();
        assert_eq!(line.push_bytes(b"t0=123456789"), 8);
        assert!(line.is_full());
        assert_eq!(line.free(), 0);
    }

    #[test]
    fn test_overflow_discards_pending() {
        let mut line = LineBuffer::<8>::new();
        line.push_bytes(b"t0=12345");
        assert_eq!(line.check_overflow(), Err(LineError::Overflow));
        assert!(line.is_empty());

        // Tail of the overlong command is dropped, the next one survives
        assert_eq!(line.push_bytes(b"678;t0=1;"), 9);
        assert_eq!(line.check_overflow(), Ok(()));
        assert_eq!(line.next_command().unwrap().as_slice(), b"t0=1");
        assert!(line.next_command().is_none());
    }

    #[test]
    fn test_overflow_tail_spanning_reads() {
        let mut line = LineBuffer::<4>::new();
        line.push_bytes(b"t0=1");
        assert_eq!(line.check_overflow(), Err(LineError::Overflow));

        assert_eq!(line.push_bytes(b"2345"), 4);
        assert!(line.is_empty());
        line.push_bytes(b"6;t1;");
        assert_eq!(line.next_command().unwrap().as_slice(), b"t1");
    }

    #[test]
    fn test_full_buffer_with_terminator_is_not_overflow() {
        let mut line = LineBuffer::<6>::new();
        line.push_bytes(b"t0=10;");
        assert!(line.is_full());
        assert_eq!(line.check_overflow(), Ok(()));
        assert_eq!(line.next_command().unwrap().as_slice(), b"t0=10");
    }
}
