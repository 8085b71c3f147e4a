//! Range-addressed text edits against an immutable source.
//!
//! `EditBuffer` records overwrites and insertions without touching the
//! original string, then renders the edited text together with a segment
//! source map in a single pass. Conflicting edits are rejected when they are
//! queued, never at render time.

use crate::Span;
use serde::Serialize;
use thiserror::Error;

/// Errors raised by conflicting or malformed edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("cannot edit an empty range at {0}")]
    EmptyRange(u32),
    #[error("range {start}..{end} is out of bounds (source length {len})")]
    OutOfBounds { start: u32, end: u32, len: u32 },
    #[error("offset {0} is not on a character boundary")]
    CharBoundary(u32),
    #[error("range {start}..{end} overlaps an existing overwrite")]
    Overlap { start: u32, end: u32 },
}

/// Which neighbour an insertion sticks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone)]
struct Overwrite {
    span: Span,
    content: String,
}

#[derive(Debug, Clone)]
struct Insert {
    pos: u32,
    side: Side,
    seq: usize,
    content: String,
}

/// A single source mapping entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceMapping {
    /// Range in the original source
    pub original: Span,
    /// Range in the rendered output
    pub generated: Span,
}

/// Segment source map correlating output ranges with input ranges.
///
/// Inserted text has no mapping; every copied or overwritten range has one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceMap {
    pub source: String,
    pub mappings: Vec<SourceMapping>,
}

impl SourceMap {
    /// Map a generated offset back to the original source.
    pub fn original_offset(&self, generated: u32) -> Option<u32> {
        self.mappings
            .iter()
            .find(|m| m.generated.contains(generated))
            .map(|m| {
                let relative = generated - m.generated.start;
                m.original.start + relative.min(m.original.len().saturating_sub(1))
            })
    }
}

/// Edit buffer over one immutable source string.
#[derive(Debug, Clone)]
pub struct EditBuffer<'a> {
    original: &'a str,
    overwrites: Vec<Overwrite>,
    inserts: Vec<Insert>,
}

impl<'a> EditBuffer<'a> {
    pub fn new(original: &'a str) -> Self {
        Self {
            original,
            overwrites: Vec::new(),
            inserts: Vec::new(),
        }
    }

    /// The untouched source.
    pub fn original(&self) -> &'a str {
        self.original
    }

    /// Has any edit been queued?
    pub fn has_changed(&self) -> bool {
        !self.overwrites.is_empty() || !self.inserts.is_empty()
    }

    /// Replace `span` with `content`.
    pub fn overwrite(&mut self, span: Span, content: impl Into<String>) -> Result<(), EditError> {
        if span.is_empty() {
            return Err(EditError::EmptyRange(span.start));
        }
        self.check_bounds(span)?;
        let conflicting_overwrite = self.overwrites.iter().any(|o| o.span.intersects(&span));
        let splits_insert = self
            .inserts
            .iter()
            .any(|i| i.pos > span.start && i.pos < span.end);
        if conflicting_overwrite || splits_insert {
            return Err(EditError::Overlap {
                start: span.start,
                end: span.end,
            });
        }

        let index = self
            .overwrites
            .partition_point(|o| o.span.start < span.start);
        self.overwrites.insert(
            index,
            Overwrite {
                span,
                content: content.into(),
            },
        );
        Ok(())
    }

    /// Insert `content` at `pos`, attached to the character before it.
    pub fn append_left(&mut self, pos: u32, content: impl Into<String>) -> Result<(), EditError> {
        self.insert(pos, Side::Left, content.into())
    }

    /// Insert `content` at `pos`, attached to the character after it.
    pub fn append_right(&mut self, pos: u32, content: impl Into<String>) -> Result<(), EditError> {
        self.insert(pos, Side::Right, content.into())
    }

    fn insert(&mut self, pos: u32, side: Side, content: String) -> Result<(), EditError> {
        self.check_bounds(Span::new(pos, pos))?;
        if self
            .overwrites
            .iter()
            .any(|o| pos > o.span.start && pos < o.span.end)
        {
            return Err(EditError::Overlap {
                start: pos,
                end: pos,
            });
        }
        let seq = self.inserts.len();
        let insert = Insert {
            pos,
            side,
            seq,
            content,
        };
        let index = self
            .inserts
            .partition_point(|i| (i.pos, i.side, i.seq) < (pos, side, seq));
        self.inserts.insert(index, insert);
        Ok(())
    }

    fn check_bounds(&self, span: Span) -> Result<(), EditError> {
        let len = self.original.len() as u32;
        if span.start > span.end || span.end > len {
            return Err(EditError::OutOfBounds {
                start: span.start,
                end: span.end,
                len,
            });
        }
        for offset in [span.start, span.end] {
            if !self.original.is_char_boundary(offset as usize) {
                return Err(EditError::CharBoundary(offset));
            }
        }
        Ok(())
    }

    /// Render the edited text.
    pub fn render(&self) -> String {
        self.render_with_map().0
    }

    /// Render the edited text and its source map in one pass.
    pub fn render_output(&self, source_name: &str) -> (String, SourceMap) {
        let (code, mappings) = self.render_with_map();
        (
            code,
            SourceMap {
                source: source_name.to_string(),
                mappings,
            },
        )
    }

    fn render_with_map(&self) -> (String, Vec<SourceMapping>) {
        let mut renderer = Renderer {
            original: self.original,
            out: String::with_capacity(self.original.len() + 64),
            mappings: Vec::new(),
            cursor: 0,
        };
        let mut pending = self.inserts.iter().peekable();

        for overwrite in &self.overwrites {
            while let Some(insert) = pending.next_if(|i| i.pos <= overwrite.span.start) {
                renderer.copy_until(insert.pos);
                renderer.out.push_str(&insert.content);
            }
            renderer.copy_until(overwrite.span.start);
            renderer.replace(overwrite);
        }
        for insert in pending {
            renderer.copy_until(insert.pos);
            renderer.out.push_str(&insert.content);
        }
        renderer.copy_until(self.original.len() as u32);

        (renderer.out, renderer.mappings)
    }
}

impl std::fmt::Display for EditBuffer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

struct Renderer<'a> {
    original: &'a str,
    out: String,
    mappings: Vec<SourceMapping>,
    cursor: u32,
}

impl Renderer<'_> {
    fn copy_until(&mut self, target: u32) {
        if target <= self.cursor {
            return;
        }
        let generated_start = self.out.len() as u32;
        self.out
            .push_str(&self.original[self.cursor as usize..target as usize]);
        self.mappings.push(SourceMapping {
            original: Span::new(self.cursor, target),
            generated: Span::new(generated_start, self.out.len() as u32),
        });
        self.cursor = target;
    }

    fn replace(&mut self, overwrite: &Overwrite) {
        let generated_start = self.out.len() as u32;
        self.out.push_str(&overwrite.content);
        self.mappings.push(SourceMapping {
            original: overwrite.span,
            generated: Span::new(generated_start, self.out.len() as u32),
        });
        self.cursor = overwrite.span.end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_untouched() {
        let buffer = EditBuffer::new("hello world");
        assert!(!buffer.has_changed());
        assert_eq!(buffer.render(), "hello world");
    }

    #[test]
    fn test_overwrite_and_inserts() {
        let mut buffer = EditBuffer::new("abcdef");
        buffer.overwrite(Span::new(2, 4), "XY").unwrap();
        buffer.append_left(2, "<").unwrap();
        buffer.append_right(2, "[").unwrap();
        buffer.append_left(4, ">").unwrap();
        buffer.append_left(6, "!").unwrap();
        assert!(buffer.has_changed());
        assert_eq!(buffer.render(), "ab<[XY>ef!");
        assert_eq!(buffer.original(), "abcdef");
    }

    #[test]
    fn test_out_of_order_overwrites() {
        let mut buffer = EditBuffer::new("a.b.c");
        buffer.overwrite(Span::new(4, 5), "C").unwrap();
        buffer.overwrite(Span::new(0, 1), "A").unwrap();
        assert_eq!(buffer.to_string(), "A.b.C");
    }

    #[test]
    fn test_rejects_overlapping_overwrites() {
        let mut buffer = EditBuffer::new("abcdef");
        buffer.overwrite(Span::new(1, 4), "x").unwrap();
        assert_eq!(
            buffer.overwrite(Span::new(3, 5), "y"),
            Err(EditError::Overlap { start: 3, end: 5 })
        );
        assert!(buffer.append_right(2, "z").is_err());
        // adjacent edits are fine
        buffer.overwrite(Span::new(4, 5), "y").unwrap();
        assert_eq!(buffer.render(), "axyf");
    }

    #[test]
    fn test_rejects_invalid_ranges() {
        let mut buffer = EditBuffer::new("añb");
        assert_eq!(
            buffer.overwrite(Span::new(1, 1), "x"),
            Err(EditError::EmptyRange(1))
        );
        assert_eq!(
            buffer.overwrite(Span::new(2, 3), "x"),
            Err(EditError::CharBoundary(2))
        );
        assert!(matches!(
            buffer.append_left(9, "x"),
            Err(EditError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_source_map_segments() {
        let mut buffer = EditBuffer::new("abcdef");
        buffer.overwrite(Span::new(2, 4), "WXYZ").unwrap();
        let (code, map) = buffer.render_output("test.svelte");
        assert_eq!(code, "abWXYZef");
        assert_eq!(map.source, "test.svelte");
        assert_eq!(
            map.mappings,
            vec![
                SourceMapping {
                    original: Span::new(0, 2),
                    generated: Span::new(0, 2),
                },
                SourceMapping {
                    original: Span::new(2, 4),
                    generated: Span::new(2, 6),
                },
                SourceMapping {
                    original: Span::new(4, 6),
                    generated: Span::new(6, 8),
                },
            ]
        );
        assert_eq!(map.original_offset(7), Some(5));
        assert_eq!(map.original_offset(5), Some(3));
    }

    #[test]
    fn test_inserts_are_unmapped() {
        let mut buffer = EditBuffer::new("abc");
        buffer.append_right(1, "++").unwrap();
        buffer.append_left(1, "--").unwrap();
        let (code, map) = buffer.render_output("test.svelte");
        assert_eq!(code, "a--++bc");
        assert_eq!(
            map.mappings,
            vec![
                SourceMapping {
                    original: Span::new(0, 1),
                    generated: Span::new(0, 1),
                },
                SourceMapping {
                    original: Span::new(1, 3),
                    generated: Span::new(5, 7),
                },
            ]
        );
        assert_eq!(map.original_offset(2), None);
        assert_eq!(map.original_offset(5), Some(1));
    }
}
