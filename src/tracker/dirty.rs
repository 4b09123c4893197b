//! Accumulation of edits between reconciliations.

use crate::document::{Document, EditEvent};

/// Region of the buffer touched since the last reconciliation.
///
/// `[line1, line2)` are line numbers as they were before the first pending
/// edit; `line_shift` is the net number of lines added since then and
/// `total_lines_before` the buffer's line count at that time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyRegion {
    pub line1: usize,
    pub line2: usize,
    pub line_shift: isize,
    pub total_lines_before: usize,
}

impl DirtyRegion {
    pub fn new(line1: usize, line2: usize, line_shift: isize, total_lines_before: usize) -> Self {
        Self {
            line1,
            line2,
            line_shift,
            total_lines_before,
        }
    }

    /// Fold one more edit into the region.
    ///
    /// `line1..line2` of the edit are in post-region coordinates; the region
    /// only ever grows.
    pub fn merge(self, line1: usize, line2: usize, line_shift: isize) -> Self {
        let old_line2 = self.line2 as isize + self.line_shift;
        let grown = (line2 as isize - old_line2).max(0) as usize;
        Self {
            line1: self.line1.min(line1),
            line2: self.line2 + grown,
            line_shift: self.line_shift + line_shift,
            total_lines_before: self.total_lines_before,
        }
    }
}

/// Line span of an edit captured before the buffer changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PendingEdit {
    line1: usize,
    line2: usize,
    total_lines_before: usize,
}

impl PendingEdit {
    pub(crate) fn capture<D: Document + ?Sized>(document: &D, event: &EditEvent) -> Self {
        let line1 = document.line_at(event.offset);
        let line2 = if event.old_len() == 0 {
            line1 + 1
        } else {
            document.line_at(event.offset + event.old_len()) + 1
        };
        Self {
            line1,
            line2,
            total_lines_before: document.line_count(),
        }
    }

    /// Finish the capture once `event` has been applied to `document` and
    /// fold it into `region`.
    pub(crate) fn finish<D: Document + ?Sized>(
        self,
        document: &D,
        event: &EditEvent,
        region: Option<DirtyRegion>,
    ) -> DirtyRegion {
        let new_line1 = self.line1;
        let new_line2 = if event.new_len() == 0 {
            new_line1 + 1
        } else {
            document.line_at(event.offset + event.new_len()) + 1
        };
        let line_shift =
            (new_line2 - new_line1) as isize - (self.line2 - self.line1) as isize;

        let (line1, line2) = self.trim_boundary_newline(document, event);

        match region {
            Some(region) => {
                let merged = region.merge(line1, line2, line_shift);
                log::trace!(
                    target: "line_status::tracker",
                    "Merged edit {}..{} (shift {}) into dirty region {:?}",
                    line1,
                    line2,
                    line_shift,
                    merged
                );
                merged
            }
            None => DirtyRegion::new(line1, line2, line_shift, self.total_lines_before),
        }
    }

    /// An insertion or deletion of whole lines touches one line fewer than
    /// its raw span: the newline on the far side of the fragment already
    /// separated the neighbouring line.
    fn trim_boundary_newline<D: Document + ?Sized>(
        &self,
        document: &D,
        event: &EditEvent,
    ) -> (usize, usize) {
        let (line1, line2) = (self.line1, self.line2);
        let fragment = match (event.old_len(), event.new_len()) {
            (0, new_len) if new_len > 0 => &event.new_text,
            (old_len, 0) if old_len > 0 => &event.old_text,
            _ => return (line1, line2),
        };
        let offset = event.offset;

        if fragment.ends_with('\n') && offset > 0 && document.is_newline_at(offset - 1) {
            return (line1, line2 - 1);
        }
        if fragment.starts_with('\n') && document.is_newline_at(offset + event.new_len()) {
            return (line1 + 1, line2);
        }
        (line1, line2)
    }
}
