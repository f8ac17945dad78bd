//! Source locations.
//!
//! [`Span`] is a byte range into the source text. [`LineIndex`] maps byte
//! offsets back to 1-based line numbers; lowering uses it to tag runtime
//! error messages with the line that triggered them.

use std::fmt;

/// Byte range `[start, end)` in the source file.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Span for synthesized nodes with no source text.
    pub const DUMMY: Span = Span { start: 0, end: 0 };

    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }

    #[inline]
    pub const fn len(&self) -> u32 {
        self.end - self.start
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Smallest span covering both `self` and `other`.
    #[inline]
    #[must_use]
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Offsets at which each source line begins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineIndex {
    /// Always starts with `0`; strictly increasing.
    line_starts: Vec<u32>,
}

impl LineIndex {
    /// Build the index by scanning `source` for newlines.
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (offset, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                // Offsets past u32::MAX cannot appear in a Span either.
                if let Ok(next) = u32::try_from(offset + 1) {
                    line_starts.push(next);
                }
            }
        }
        LineIndex { line_starts }
    }

    /// Build the index from precomputed line starts.
    ///
    /// The list is sorted and deduplicated, and `0` is added if missing.
    pub fn from_line_starts(mut line_starts: Vec<u32>) -> Self {
        line_starts.push(0);
        line_starts.sort_unstable();
        line_starts.dedup();
        LineIndex { line_starts }
    }

    /// 1-based line containing `offset`.
    pub fn line_of(&self, offset: u32) -> u32 {
        let idx = self.line_starts.partition_point(|&start| start <= offset);
        // idx >= 1 since line_starts[0] == 0 <= offset
        u32::try_from(idx).unwrap_or(u32::MAX)
    }

    /// 1-based line on which `span` starts.
    #[inline]
    pub fn line_of_span(&self, span: Span) -> u32 {
        self.line_of(span.start)
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

impl Default for LineIndex {
    fn default() -> Self {
        LineIndex {
            line_starts: vec![0],
        }
    }
}
