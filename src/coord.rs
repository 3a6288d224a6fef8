//! Closed intervals over a read, in the read's own forward frame.

use std::fmt;

/// An inclusive `[start, end]` interval over a sequence of length `seq_len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeqCoord {
    pub start: usize,
    pub end: usize,
    pub seq_len: usize,
}

impl SeqCoord {
    pub fn new(start: usize, end: usize, seq_len: usize) -> Self {
        debug_assert!(start <= end && end < seq_len, "bad interval");
        Self {
            start,
            end,
            seq_len,
        }
    }

    /// Number of bases covered by the interval.
    pub fn length(&self) -> usize {
        self.end - self.start + 1
    }

    /// The interval spans the whole sequence.
    #[inline]
    pub fn is_contained(&self) -> bool {
        self.is_left_extreme() && self.is_right_extreme()
    }

    #[inline]
    pub fn is_left_extreme(&self) -> bool {
        self.start == 0
    }

    #[inline]
    pub fn is_right_extreme(&self) -> bool {
        self.end == self.seq_len - 1
    }

    #[inline]
    pub fn is_extreme(&self) -> bool {
        self.is_left_extreme() || self.is_right_extreme()
    }

    /// Map the interval onto the reverse-complement strand.
    pub fn flip(&mut self) {
        let last = self.seq_len - 1;
        let start = last - self.end;
        let end = last - self.start;
        self.start = start;
        self.end = end;
    }

    pub fn flipped(mut self) -> Self {
        self.flip();
        self
    }
}

impl fmt::Display for SeqCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.start, self.end, self.seq_len)
    }
}
