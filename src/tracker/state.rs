//! Mutable tracker state guarded by the tracker's lock.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::dirty::PendingEdit;
use super::{DirtyRegion, Highlighter, Range, RangeId};
use crate::config::TrackerSettings;
use crate::diff::{DiffError, LineDiff, RangeBuilder, SimilarLineDiff};
use crate::document::{Document, EditEvent, TextDocument};

pub(crate) struct TrackerState<H: Highlighter> {
    pub(super) baseline: Arc<TextDocument>,
    /// Last reconciled ranges, sorted and non-overlapping on both sides
    pub(super) ranges: Vec<Range>,
    pub(super) dirty: Option<DirtyRegion>,
    pending: Option<PendingEdit>,
    /// Set when edit notifications arrived out of order
    needs_rebuild: bool,

    pub(super) initialized: bool,
    pub(super) released: bool,
    pub(super) bulk_update: bool,
    pub(super) too_big: bool,
    pub(super) during_rollback: bool,

    handles: HashMap<RangeId, H::Handle>,
    to_install: Vec<RangeId>,
    to_dispose: Vec<RangeId>,
    next_id: u64,

    differ: Box<dyn LineDiff>,
    custom_differ: bool,
    refine_inner_ranges: bool,
    pub(super) highlighter: H,
}

impl<H: Highlighter> TrackerState<H> {
    pub(super) fn new(
        highlighter: H,
        settings: &TrackerSettings,
        differ: Option<Box<dyn LineDiff>>,
    ) -> Self {
        let custom_differ = differ.is_some();
        let differ =
            differ.unwrap_or_else(|| Box::new(SimilarLineDiff::from_settings(settings)));
        Self {
            baseline: Arc::new(TextDocument::default()),
            ranges: Vec::new(),
            dirty: None,
            pending: None,
            needs_rebuild: false,
            initialized: false,
            released: false,
            bulk_update: false,
            too_big: false,
            during_rollback: false,
            handles: HashMap::new(),
            to_install: Vec::new(),
            to_dispose: Vec::new(),
            next_id: 0,
            differ,
            custom_differ,
            refine_inner_ranges: settings.refine_inner_ranges,
            highlighter,
        }
    }

    /// Why queries cannot be answered, if they cannot.
    pub(super) fn unavailable_reason(&self) -> Option<&'static str> {
        if !self.initialized {
            Some("not initialized")
        } else if self.released {
            Some("released")
        } else if self.bulk_update {
            Some("bulk update in progress")
        } else if self.during_rollback {
            Some("rollback in progress")
        } else if self.too_big {
            Some("too big to diff")
        } else {
            None
        }
    }

    pub(super) fn is_suppressed(&self) -> bool {
        self.unavailable_reason().is_some()
    }

    pub(super) fn is_valid(&self) -> bool {
        !self.is_suppressed() && !self.has_unreconciled_edits()
    }

    /// An edit was reported but not folded into the ranges yet.
    pub(super) fn has_unreconciled_edits(&self) -> bool {
        self.dirty.is_some() || self.pending.is_some() || self.needs_rebuild
    }

    pub(super) fn builder(&self) -> RangeBuilder<'_> {
        RangeBuilder::new(self.differ.as_ref(), self.refine_inner_ranges)
    }

    pub(super) fn find(&self, id: RangeId) -> Option<&Range> {
        if id.is_detached() {
            return None;
        }
        self.ranges.iter().find(|range| range.id() == id)
    }

    pub(super) fn stamp(&mut self, mut range: Range) -> Range {
        self.next_id += 1;
        range.set_id(RangeId::new(self.next_id));
        range
    }

    pub(super) fn set_baseline<D: Document + ?Sized>(&mut self, document: &D, text: String) {
        if self.released {
            return;
        }
        self.baseline = Arc::new(TextDocument::new(text));
        self.initialized = true;
        self.reinstall_ranges(document);
    }

    /// Swap settings in; returns true when ranges were rebuilt.
    pub(super) fn apply_settings<D: Document + ?Sized>(
        &mut self,
        document: &D,
        old: &TrackerSettings,
        new: &TrackerSettings,
    ) -> bool {
        if !old.requires_rebuild(new) {
            return false;
        }
        if !self.custom_differ {
            self.differ = Box::new(SimilarLineDiff::from_settings(new));
        }
        self.refine_inner_ranges = new.refine_inner_ranges;
        self.reinstall_ranges(document);
        true
    }

    /// Drop all ranges and diff the whole buffer again.
    pub(super) fn reinstall_ranges<D: Document + ?Sized>(&mut self, document: &D) {
        if !self.initialized || self.released || self.bulk_update {
            return;
        }
        self.destroy_ranges();

        let result = self.builder().build_full(document, &*self.baseline);
        match result {
            Ok(ranges) => {
                log::debug!(
                    target: "line_status::tracker",
                    "Rebuilt {} ranges over {} lines",
                    ranges.len(),
                    document.line_count()
                );
                for range in ranges {
                    let range = self.stamp(range);
                    let handle = self.highlighter.install(&range);
                    self.handles.insert(range.id(), handle);
                    self.ranges.push(range);
                }
                if self.ranges.is_empty() {
                    self.highlighter.file_unchanged();
                }
            }
            Err(err) => self.install_too_big(err),
        }
    }

    /// Forget every range, handle and pending change.
    pub(super) fn destroy_ranges(&mut self) {
        self.remove_too_big();
        for (_, handle) in self.handles.drain() {
            self.highlighter.dispose(handle);
        }
        self.ranges.clear();
        self.to_install.clear();
        self.to_dispose.clear();
        self.dirty = None;
        self.pending = None;
        self.needs_rebuild = false;
    }

    pub(super) fn install_too_big(&mut self, err: DiffError) {
        log::info!(target: "line_status::tracker", "Too big to diff: {}", err);
        self.too_big = true;
        self.highlighter.too_big_to_diff(true);
    }

    fn remove_too_big(&mut self) {
        if self.too_big {
            log::info!(target: "line_status::tracker", "Leaving too-big mode");
            self.too_big = false;
            self.highlighter.too_big_to_diff(false);
        }
    }

    pub(super) fn before_edit<D: Document + ?Sized>(&mut self, document: &D, event: &EditEvent) {
        if self.is_suppressed() {
            return;
        }
        self.pending = Some(PendingEdit::capture(document, event));
    }

    pub(super) fn after_edit<D: Document + ?Sized>(&mut self, document: &D, event: &EditEvent) {
        if self.is_suppressed() {
            return;
        }
        let Some(pending) = self.pending.take() else {
            log::warn!(
                target: "line_status::tracker",
                "Edit at offset {} reported without a preceding notification; scheduling rebuild",
                event.offset
            );
            self.needs_rebuild = true;
            return;
        };
        self.dirty = Some(pending.finish(document, event, self.dirty));
    }

    /// Forget an edit announced by `before_edit` that never happened.
    pub(super) fn cancel_edit(&mut self) {
        self.pending = None;
    }

    pub(super) fn take_rebuild_request(&mut self) -> bool {
        std::mem::take(&mut self.needs_rebuild)
    }

    pub(super) fn schedule_install(&mut self, id: RangeId) {
        self.to_install.push(id);
    }

    pub(super) fn schedule_dispose(&mut self, id: RangeId) {
        self.to_dispose.push(id);
    }

    /// Bring highlighter handles in line with the ranges.
    pub(super) fn update_highlighters(&mut self) {
        for id in self.to_dispose.drain(..) {
            if let Some(handle) = self.handles.remove(&id) {
                self.highlighter.dispose(handle);
            }
        }
        if self.to_install.is_empty() {
            return;
        }
        let pending: HashSet<RangeId> = self.to_install.drain(..).collect();
        for range in &self.ranges {
            if pending.contains(&range.id()) {
                let handle = self.highlighter.install(range);
                self.handles.insert(range.id(), handle);
            }
        }
    }

    pub(super) fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.destroy_ranges();
    }

    pub(super) fn start_bulk_update(&mut self) {
        if self.released || self.bulk_update {
            return;
        }
        self.bulk_update = true;
        self.destroy_ranges();
    }

    pub(super) fn finish_bulk_update<D: Document + ?Sized>(&mut self, document: &D) {
        if self.released || !self.bulk_update {
            return;
        }
        self.bulk_update = false;
        self.reinstall_ranges(document);
    }

    #[cfg(test)]
    pub(super) fn installed_handles(&self) -> usize {
        self.handles.len()
    }
}
