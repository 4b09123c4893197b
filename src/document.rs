//! The buffer contract the tracker works against.
//!
//! The tracker never owns the edited buffer. It reads it through [`Document`]
//! and, for rollback only, writes to it through [`Document::replace`].

pub mod edit;
mod text;

pub use edit::{EditEvent, apply_modification};
pub use text::TextDocument;

use std::borrow::Cow;
use std::ops::Range;
use thiserror::Error;

/// Errors a document can report when asked to change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// The requested span does not lie within the document
    #[error("Span {start}..{end} is out of bounds for a document of {len} bytes")]
    OutOfBounds { start: usize, end: usize, len: usize },

    /// The span does not start and end on character boundaries
    #[error("Span {start}..{end} splits a character")]
    NotCharBoundary { start: usize, end: usize },

    /// The document refuses modification
    #[error("Document is read-only")]
    ReadOnly,
}

/// Line-addressable text buffer.
///
/// Line numbers are 0-based. A text with N newlines has N+1 lines, so
/// `line_count()` is never 0 and a trailing newline yields a final empty line.
pub trait Document {
    /// Length in bytes.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn line_count(&self) -> usize;

    /// Line containing the byte offset. `offset == len()` maps to the last line.
    fn line_at(&self, offset: usize) -> usize;

    fn line_start_offset(&self, line: usize) -> usize;

    /// Offset of the end of the line, excluding its newline.
    fn line_end_offset(&self, line: usize) -> usize;

    fn text_between(&self, start: usize, end: usize) -> Cow<'_, str>;

    /// Replace `old_len` bytes at `offset` with `text`.
    fn replace(&mut self, offset: usize, old_len: usize, text: &str) -> Result<(), DocumentError>;

    /// Byte span covered by the lines `[line1, line2)`, without the final newline.
    ///
    /// An empty line span maps to an empty byte span at the start of `line1`
    /// (or at the end of the text when `line1 == line_count()`).
    fn text_range_of_lines(&self, line1: usize, line2: usize) -> Range<usize> {
        if line1 == line2 {
            let offset = if line1 < self.line_count() {
                self.line_start_offset(line1)
            } else {
                self.len()
            };
            return offset..offset;
        }
        self.line_start_offset(line1)..self.line_end_offset(line2 - 1)
    }

    /// Contents of the lines `[line1, line2)` without line separators.
    fn lines(&self, line1: usize, line2: usize) -> Vec<String> {
        (line1..line2)
            .map(|line| {
                self.text_between(self.line_start_offset(line), self.line_end_offset(line))
                    .into_owned()
            })
            .collect()
    }

    fn is_newline_at(&self, offset: usize) -> bool {
        offset < self.len() && self.text_between(offset, offset + 1) == "\n"
    }

    /// True when the text from the start of `line1` to the start of `line2`
    /// is empty or whitespace. `line_count()` stands for the end of the text.
    fn is_line_range_blank(&self, line1: usize, line2: usize) -> bool {
        if line1 >= line2 {
            return true;
        }
        let line_count = self.line_count();
        let offset_of = |line: usize| {
            if line >= line_count {
                self.len()
            } else {
                self.line_start_offset(line)
            }
        };
        crate::text::is_blank(&self.text_between(offset_of(line1), offset_of(line2)))
    }
}
