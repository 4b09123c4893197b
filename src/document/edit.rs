//! Edit events and line-level modifications.

use super::{Document, DocumentError};

/// One buffer mutation as reported by the editor.
///
/// Both fragments are carried: the dirty region bookkeeping looks at their
/// first and last characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditEvent {
    pub offset: usize,
    pub old_text: String,
    pub new_text: String,
}

impl EditEvent {
    pub fn new(offset: usize, old_text: impl Into<String>, new_text: impl Into<String>) -> Self {
        Self {
            offset,
            old_text: old_text.into(),
            new_text: new_text.into(),
        }
    }

    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Self::new(offset, String::new(), text)
    }

    pub fn delete(offset: usize, old_text: impl Into<String>) -> Self {
        Self::new(offset, old_text, String::new())
    }

    pub fn old_len(&self) -> usize {
        self.old_text.len()
    }

    pub fn new_len(&self) -> usize {
        self.new_text.len()
    }

    /// Apply the event to a document.
    pub fn apply<D: Document + ?Sized>(&self, document: &mut D) -> Result<(), DocumentError> {
        document.replace(self.offset, self.old_len(), &self.new_text)
    }
}

/// Make lines `[line1, line2)` of `document` equal to lines
/// `[source_line1, source_line2)` of `source`.
///
/// Pure insertions and deletions are handled separately so that the line
/// separators around the affected block stay well-formed.
pub fn apply_modification<D, S>(
    document: &mut D,
    line1: usize,
    line2: usize,
    source: &S,
    source_line1: usize,
    source_line2: usize,
) -> Result<(), DocumentError>
where
    D: Document + ?Sized,
    S: Document + ?Sized,
{
    if line1 == line2 && source_line1 == source_line2 {
        return Ok(());
    }

    let source_span = source.text_range_of_lines(source_line1, source_line2);
    let content = source.text_between(source_span.start, source_span.end);

    if line1 == line2 {
        insert_lines(document, line1, &content)
    } else if source_line1 == source_line2 {
        delete_lines(document, line1, line2)
    } else {
        replace_lines(document, line1, line2, &content)
    }
}

fn insert_lines<D: Document + ?Sized>(
    document: &mut D,
    line: usize,
    content: &str,
) -> Result<(), DocumentError> {
    if line == document.line_count() {
        let end = document.len();
        document.replace(end, 0, &format!("\n{content}"))
    } else {
        let start = document.line_start_offset(line);
        document.replace(start, 0, &format!("{content}\n"))
    }
}

fn delete_lines<D: Document + ?Sized>(
    document: &mut D,
    line1: usize,
    line2: usize,
) -> Result<(), DocumentError> {
    let span = document.text_range_of_lines(line1, line2);
    let (mut start, mut end) = (span.start, span.end);
    if start > 0 {
        start -= 1;
    } else if end < document.len() {
        end += 1;
    }
    document.replace(start, end - start, "")
}

fn replace_lines<D: Document + ?Sized>(
    document: &mut D,
    line1: usize,
    line2: usize,
    content: &str,
) -> Result<(), DocumentError> {
    let span = document.text_range_of_lines(line1, line2);
    document.replace(span.start, span.end - span.start, content)
}
