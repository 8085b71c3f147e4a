//! Byte ranges into a component source.

use serde::{Deserialize, Serialize};

/// Half-open byte range `[start, end)` into the original source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Start byte offset
    pub start: u32,
    /// End byte offset
    pub end: u32,
}

impl Span {
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Span of `len` bytes beginning at `start`.
    pub const fn sized(start: u32, len: u32) -> Self {
        Self {
            start,
            end: start + len,
        }
    }

    /// Check if this span contains the given offset.
    pub fn contains(&self, offset: u32) -> bool {
        offset >= self.start && offset < self.end
    }

    /// Get the length of this span.
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Check if this span is empty.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Shift both ends by `offset`.
    pub fn offset_by(self, offset: u32) -> Self {
        Self {
            start: self.start + offset,
            end: self.end + offset,
        }
    }

    /// Do the two spans share at least one byte?
    pub fn intersects(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Slice `source` with this span.
    pub fn source_text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.start as usize..self.end as usize]
    }
}
