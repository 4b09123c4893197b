use std::borrow::Cow;
use std::collections::BTreeSet;
use std::marker::PhantomData;
use std::sync::Arc;

use super::range::shift_line;
use super::{Highlighter, LineStatusTracker, Range};
use crate::config::TrackerSettings;
use crate::document::{Document, DocumentError, EditEvent, apply_modification};
use crate::error::{TrackerError, TrackerResult};

/// Mutation capability of a [`LineStatusTracker`].
///
/// Only obtainable on the tracker's owning thread and not `Send`, so every
/// mutation happens on that thread.
pub struct TrackerUi<'a, H: Highlighter> {
    pub(super) tracker: &'a LineStatusTracker<H>,
    pub(super) _not_send: PhantomData<*const ()>,
}

impl<'a, H: Highlighter> TrackerUi<'a, H> {
    /// Replace the baseline and rebuild all ranges against `document`.
    ///
    /// Leaves too-big mode if the new pair can be diffed.
    pub fn set_baseline<D: Document + ?Sized>(&self, document: &D, text: impl Into<String>) {
        let mut state = self.tracker.lock();
        state.set_baseline(document, text.into());
        state.update_highlighters();
    }

    /// Must be called before `event` is applied to `document`.
    pub fn before_edit<D: Document + ?Sized>(&self, document: &D, event: &EditEvent) {
        self.tracker.lock().before_edit(document, event);
    }

    /// Must be called after `event` has been applied to `document`.
    pub fn after_edit<D: Document + ?Sized>(&self, document: &D, event: &EditEvent) {
        self.tracker.lock().after_edit(document, event);
    }

    /// Apply `event` to `document` with both notifications around it.
    pub fn edit<D: Document + ?Sized>(&self, document: &mut D, event: &EditEvent) -> TrackerResult<()> {
        self.before_edit(document, event);
        if let Err(err) = event.apply(document) {
            self.tracker.lock().cancel_edit();
            return Err(err.into());
        }
        self.after_edit(document, event);
        Ok(())
    }

    /// Reconcile pending edits and update highlighters.
    pub fn flush<D: Document + ?Sized>(&self, document: &D) {
        let mut state = self.tracker.lock();
        state.update_ranges(document);
        state.update_highlighters();
    }

    /// Flush, then hand out the tracker for up-to-date queries.
    pub fn synced<D: Document + ?Sized>(&self, document: &D) -> &'a LineStatusTracker<H> {
        self.flush(document);
        self.tracker
    }

    /// Revert `ranges` in `document` to their baseline content.
    ///
    /// Ranges are matched by identity against the tracked ones; the batch
    /// stops at the first range that is no longer tracked. Returns the number
    /// of ranges rolled back.
    ///
    /// A document that refuses one of the modifications ends the batch
    /// there. The failure is logged and all ranges are rebuilt from scratch;
    /// it is not returned as an error.
    pub fn rollback<D: Document + ?Sized>(
        &self,
        document: &mut D,
        ranges: &[Range],
    ) -> TrackerResult<usize> {
        let (targets, baseline) = {
            let mut state = self.tracker.lock();
            state.update_ranges(&*document);
            state.update_highlighters();
            if let Some(reason) = state.unavailable_reason() {
                return Err(TrackerError::unavailable(reason));
            }

            let mut targets = Vec::with_capacity(ranges.len());
            for range in ranges {
                match state.find(range.id()) {
                    Some(live) => targets.push(live.clone()),
                    None => {
                        log::warn!(
                            target: "line_status::rollback",
                            "Range {:?} is no longer tracked; stopping rollback",
                            range.key()
                        );
                        break;
                    }
                }
            }
            targets.sort_by_key(Range::line1);
            targets.dedup_by_key(|range| range.id());
            if targets.is_empty() {
                return Ok(0);
            }

            state.during_rollback = true;
            (targets, Arc::clone(&state.baseline))
        };

        // The lock is not held while the document changes, so a document
        // that reports its own edits back to the tracker finds it suppressed.
        let mut shift: isize = 0;
        let mut applied = 0;
        let mut failure = None;
        for range in &targets {
            let line1 = shift_line(range.line1(), shift);
            let line2 = shift_line(range.line2(), shift);
            if let Err(err) = apply_modification(
                document,
                line1,
                line2,
                &*baseline,
                range.vcs_line1(),
                range.vcs_line2(),
            ) {
                failure = Some(err);
                break;
            }
            shift += (range.vcs_line2() - range.vcs_line1()) as isize
                - (range.line2() - range.line1()) as isize;
            applied += 1;
        }

        let mut state = self.tracker.lock();
        state.during_rollback = false;

        if let Some(err) = failure {
            log::error!(
                target: "line_status::rollback",
                "Rollback stopped after {} of {} ranges, rebuilding: {}",
                applied,
                targets.len(),
                err
            );
            state.reinstall_ranges(&*document);
            state.update_highlighters();
            return Ok(applied);
        }

        let first_line = targets[0].line1();
        let last_line = targets[targets.len() - 1].line2();
        let total_lines_before = (document.line_count() as isize - shift).max(0) as usize;
        if let Err(err) =
            state.update_span(&*document, first_line, last_line, shift, total_lines_before)
        {
            log::error!(
                target: "line_status::rollback",
                "Reconciliation after rollback failed, rebuilding: {}",
                err
            );
            state.reinstall_ranges(&*document);
        }
        state.update_highlighters();
        Ok(targets.len())
    }

    /// Roll back every range selected by one of `lines`.
    pub fn rollback_lines<D: Document + ?Sized>(
        &self,
        document: &mut D,
        lines: &BTreeSet<usize>,
    ) -> TrackerResult<usize> {
        let selected: Vec<Range> = self
            .synced(&*document)
            .ranges()?
            .into_iter()
            .filter(|range| {
                if range.line1() == range.line2() {
                    lines.contains(&range.line1())
                } else {
                    lines.range(range.line1()..range.line2()).next().is_some()
                }
            })
            .collect();
        if selected.is_empty() {
            return Ok(0);
        }
        self.rollback(document, &selected)
    }

    /// Suspend tracking while the buffer is rewritten wholesale.
    pub fn start_bulk_update(&self) {
        self.tracker.lock().start_bulk_update();
    }

    /// Resume tracking with a full rebuild.
    pub fn finish_bulk_update<D: Document + ?Sized>(&self, document: &D) {
        let mut state = self.tracker.lock();
        state.finish_bulk_update(document);
        state.update_highlighters();
    }

    /// Stop tracking for good and dispose every highlight.
    pub fn release(&self) {
        self.tracker.lock().release();
    }

    /// Swap in new settings; returns true when ranges were rebuilt.
    pub fn apply_settings<D: Document + ?Sized>(&self, document: &D, settings: TrackerSettings) -> bool {
        let previous = self.tracker.settings.swap(Arc::new(settings.clone()));
        let mut state = self.tracker.lock();
        let rebuilt = state.apply_settings(document, &previous, &settings);
        state.update_highlighters();
        rebuilt
    }
}

/// A document that reports every change made through
/// [`Document::replace`] to a tracker.
///
/// Edits made while the tracker is rolling back are ignored by the tracker,
/// so rollback may target a `TrackedDocument` directly.
pub struct TrackedDocument<'u, 'a, D, H: Highlighter> {
    document: D,
    ui: &'u TrackerUi<'a, H>,
}

impl<'u, 'a, D: Document, H: Highlighter> TrackedDocument<'u, 'a, D, H> {
    pub fn new(document: D, ui: &'u TrackerUi<'a, H>) -> Self {
        Self { document, ui }
    }

    pub fn get(&self) -> &D {
        &self.document
    }

    pub fn into_inner(self) -> D {
        self.document
    }
}

impl<D: Document, H: Highlighter> Document for TrackedDocument<'_, '_, D, H> {
    fn len(&self) -> usize {
        self.document.len()
    }

    fn line_count(&self) -> usize {
        self.document.line_count()
    }

    fn line_at(&self, offset: usize) -> usize {
        self.document.line_at(offset)
    }

    fn line_start_offset(&self, line: usize) -> usize {
        self.document.line_start_offset(line)
    }

    fn line_end_offset(&self, line: usize) -> usize {
        self.document.line_end_offset(line)
    }

    fn text_between(&self, start: usize, end: usize) -> Cow<'_, str> {
        self.document.text_between(start, end)
    }

    fn is_newline_at(&self, offset: usize) -> bool {
        self.document.is_newline_at(offset)
    }

    fn replace(&mut self, offset: usize, old_len: usize, text: &str) -> Result<(), DocumentError> {
        let old_text = self.document.text_between(offset, offset + old_len).into_owned();
        let event = EditEvent::new(offset, old_text, text);
        self.ui.before_edit(&self.document, &event);
        if let Err(err) = self.document.replace(offset, old_len, text) {
            self.ui.tracker.lock().cancel_edit();
            return Err(err);
        }
        self.ui.after_edit(&self.document, &event);
        Ok(())
    }
}
