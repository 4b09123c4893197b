use std::borrow::Cow;

use super::{Document, DocumentError};
use crate::text::compute_line_starts;

/// A plain `String`-backed document with a cached line start table.
///
/// Also used to hold baseline snapshots, which are never edited after
/// construction.
#[derive(Clone, Debug, Default)]
pub struct TextDocument {
    text: String,
    line_starts: Vec<usize>,
    version: Option<i32>,
}

impl TextDocument {
    /// Create a new text document
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let line_starts = compute_line_starts(&text);
        Self {
            text,
            line_starts,
            version: None,
        }
    }

    /// Create a new text document with version
    pub fn with_version(text: impl Into<String>, version: i32) -> Self {
        Self {
            version: Some(version),
            ..Self::new(text)
        }
    }

    /// Get the text content
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Get the text content as owned String
    pub fn into_text(self) -> String {
        self.text
    }

    /// Get the document version
    pub fn version(&self) -> Option<i32> {
        self.version
    }

    fn bump_version(&mut self) {
        if let Some(version) = self.version.as_mut() {
            *version += 1;
        }
    }
}

impl Document for TextDocument {
    fn len(&self) -> usize {
        self.text.len()
    }

    fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    fn line_at(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line.saturating_sub(1),
        }
    }

    fn line_start_offset(&self, line: usize) -> usize {
        self.line_starts
            .get(line)
            .copied()
            .unwrap_or(self.text.len())
    }

    fn line_end_offset(&self, line: usize) -> usize {
        match self.line_starts.get(line + 1) {
            Some(next_start) => next_start - 1,
            None => self.text.len(),
        }
    }

    fn text_between(&self, start: usize, end: usize) -> Cow<'_, str> {
        Cow::Borrowed(self.text.get(start..end).unwrap_or_default())
    }

    fn replace(&mut self, offset: usize, old_len: usize, text: &str) -> Result<(), DocumentError> {
        let end = offset + old_len;
        if end > self.text.len() {
            return Err(DocumentError::OutOfBounds {
                start: offset,
                end,
                len: self.text.len(),
            });
        }
        if !self.text.is_char_boundary(offset) || !self.text.is_char_boundary(end) {
            return Err(DocumentError::NotCharBoundary { start: offset, end });
        }

        self.text.replace_range(offset..end, text);
        self.line_starts = compute_line_starts(&self.text);
        self.bump_version();
        Ok(())
    }

    fn is_newline_at(&self, offset: usize) -> bool {
        self.text.as_bytes().get(offset) == Some(&b'\n')
    }
}
