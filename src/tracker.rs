//! Incremental line status tracking.
//!
//! A [`LineStatusTracker`] keeps the list of [`Range`]s describing how a live
//! buffer differs from a baseline text. Edits are folded into a dirty region
//! and reconciled lazily; only the part of the range list touched by the
//! edits is recomputed.
//!
//! Queries may be issued from any thread. Other threads observe the last
//! reconciled ranges; on the owning thread queries are unavailable while an
//! edit is waiting to be reconciled, so go through [`TrackerUi::synced`]
//! there. Mutation is restricted to the thread that created the tracker,
//! through the [`TrackerUi`] capability returned by [`LineStatusTracker::ui`].

mod dirty;
mod highlight;
mod range;
mod reconcile;
mod state;
mod ui;

pub use dirty::DirtyRegion;
pub use highlight::{Highlighter, NoopHighlighter, TOO_BIG_MESSAGE};
pub use range::{InnerRange, Range, RangeId, RangeKind};
pub use ui::{TrackedDocument, TrackerUi};

use std::marker::PhantomData;
use std::ops;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, ThreadId};

use arc_swap::ArcSwap;

use crate::config::TrackerSettings;
use crate::diff::LineDiff;
use crate::document::{Document, TextDocument};
use crate::error::{LockResultExt, TrackerError, TrackerResult};
use state::TrackerState;

/// Line status of one buffer against its baseline.
pub struct LineStatusTracker<H: Highlighter> {
    state: Mutex<TrackerState<H>>,
    settings: ArcSwap<TrackerSettings>,
    owner: ThreadId,
}

impl<H: Highlighter> std::fmt::Debug for LineStatusTracker<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("LineStatusTracker")
            .field("ranges", &state.ranges.len())
            .field("dirty", &state.dirty)
            .field("unavailable", &state.unavailable_reason())
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

impl<H: Highlighter> LineStatusTracker<H> {
    /// Create an uninitialized tracker owned by the current thread.
    ///
    /// Nothing is tracked until [`TrackerUi::set_baseline`] is called.
    pub fn new(highlighter: H, settings: TrackerSettings) -> Self {
        Self::build(highlighter, settings, None)
    }

    /// Like [`new`](Self::new), with a custom diff primitive.
    ///
    /// Settings changes keep using `differ`; only inner range refinement
    /// follows the settings.
    pub fn with_differ(highlighter: H, settings: TrackerSettings, differ: Box<dyn LineDiff>) -> Self {
        Self::build(highlighter, settings, Some(differ))
    }

    fn build(highlighter: H, settings: TrackerSettings, differ: Option<Box<dyn LineDiff>>) -> Self {
        let state = TrackerState::new(highlighter, &settings, differ);
        Self {
            state: Mutex::new(state),
            settings: ArcSwap::from_pointee(settings),
            owner: thread::current().id(),
        }
    }

    /// Mutation capability, available only on the owning thread.
    pub fn ui(&self) -> TrackerResult<TrackerUi<'_, H>> {
        if thread::current().id() != self.owner {
            return Err(TrackerError::WrongThread);
        }
        Ok(TrackerUi {
            tracker: self,
            _not_send: PhantomData,
        })
    }

    /// Why queries from the calling thread cannot be answered.
    fn unanswerable(&self, state: &TrackerState<H>) -> Option<&'static str> {
        state.unavailable_reason().or_else(|| {
            (thread::current().id() == self.owner && state.has_unreconciled_edits())
                .then_some("edits not reconciled")
        })
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, TrackerState<H>> {
        self.state.lock().recover_poison("LineStatusTracker::state")
    }

    pub fn settings(&self) -> Arc<TrackerSettings> {
        self.settings.load_full()
    }

    /// Initialized and not released.
    pub fn is_operational(&self) -> bool {
        let state = self.lock();
        state.initialized && !state.released
    }

    /// Queries are answerable and no edit is waiting to be reconciled.
    pub fn is_valid(&self) -> bool {
        self.lock().is_valid()
    }

    pub fn is_too_big_to_diff(&self) -> bool {
        self.lock().too_big
    }

    /// Whether `range` is still one of the tracked ranges.
    pub fn is_valid_range(&self, range: &Range) -> bool {
        let state = self.lock();
        self.unanswerable(&state).is_none() && state.find(range.id()).is_some()
    }

    /// The baseline snapshot, once one has been set.
    pub fn baseline(&self) -> Option<Arc<TextDocument>> {
        let state = self.lock();
        state.initialized.then(|| Arc::clone(&state.baseline))
    }

    /// Run `f` against the highlighter.
    pub fn with_highlighter<R>(&self, f: impl FnOnce(&H) -> R) -> R {
        f(&self.lock().highlighter)
    }

    /// The last reconciled ranges.
    ///
    /// Unavailable on the owning thread while edits are unreconciled.
    pub fn ranges(&self) -> TrackerResult<Vec<Range>> {
        let state = self.lock();
        if let Some(reason) = self.unanswerable(&state) {
            return Err(TrackerError::unavailable(reason));
        }
        Ok(state.ranges.clone())
    }

    fn query<R>(&self, f: impl FnOnce(&[Range]) -> Option<R>) -> Option<R> {
        let state = self.lock();
        if self.unanswerable(&state).is_some() {
            return None;
        }
        f(&state.ranges)
    }

    /// The range a caret on `line` is on.
    pub fn range_for_line(&self, line: usize) -> Option<Range> {
        self.query(|ranges| {
            ranges
                .iter()
                .find(|range| range.is_selected_by_line(line))
                .cloned()
        })
    }

    /// First range below `line` that `line` does not select.
    pub fn next_range(&self, line: usize) -> Option<Range> {
        self.query(|ranges| {
            ranges
                .iter()
                .find(|range| line < range.line2() && !range.is_selected_by_line(line))
                .cloned()
        })
    }

    /// Last range above `line` that `line` does not select.
    pub fn prev_range(&self, line: usize) -> Option<Range> {
        self.query(|ranges| {
            ranges
                .iter()
                .rev()
                .find(|range| line > range.line1() && !range.is_selected_by_line(line))
                .cloned()
        })
    }

    /// The range following `range`, if `range` is still tracked.
    pub fn next_range_after(&self, range: &Range) -> Option<Range> {
        self.query(|ranges| {
            let index = ranges.iter().position(|r| r.id() == range.id())?;
            ranges.get(index + 1).cloned()
        })
    }

    /// The range preceding `range`, if `range` is still tracked.
    pub fn prev_range_before(&self, range: &Range) -> Option<Range> {
        self.query(|ranges| {
            let index = ranges.iter().position(|r| r.id() == range.id())?;
            index.checked_sub(1).map(|prev| ranges[prev].clone())
        })
    }

    /// Whether any range intersects `[line1, line2)`.
    ///
    /// An empty span is never modified, and neither is a span that only
    /// touches the insertion point of a deleted range.
    pub fn is_range_modified(&self, line1: usize, line2: usize) -> bool {
        if line1 >= line2 {
            return false;
        }
        self.query(|ranges| {
            for range in ranges {
                if range.line1() >= line2 {
                    return Some(false);
                }
                if range.line2() > line1 {
                    return Some(true);
                }
            }
            Some(false)
        })
        .unwrap_or(false)
    }

    pub fn is_line_modified(&self, line: usize) -> bool {
        self.is_range_modified(line, line + 1)
    }

    /// Map a current-buffer line to the baseline.
    ///
    /// A line inside a range maps to the range's baseline start when
    /// `approximate`, and to `None` otherwise. An unavailable tracker maps
    /// the line to itself when `approximate`.
    pub fn transfer_line_to_vcs(&self, line: usize, approximate: bool) -> Option<usize> {
        self.transfer(line, approximate, |range| {
            (range.line1(), range.line2(), range.vcs_line1(), range.vcs_line2())
        })
    }

    /// Map a baseline line to the current buffer; the inverse of
    /// [`transfer_line_to_vcs`](Self::transfer_line_to_vcs).
    pub fn transfer_line_from_vcs(&self, line: usize, approximate: bool) -> Option<usize> {
        self.transfer(line, approximate, |range| {
            (range.vcs_line1(), range.vcs_line2(), range.line1(), range.line2())
        })
    }

    fn transfer(
        &self,
        line: usize,
        approximate: bool,
        sides: impl Fn(&Range) -> (usize, usize, usize, usize),
    ) -> Option<usize> {
        let state = self.lock();
        if self.unanswerable(&state).is_some() {
            return approximate.then_some(line);
        }

        let mut result = line as isize;
        for range in &state.ranges {
            let (from1, from2, to1, to2) = sides(range);
            if from1 <= line && line < from2 {
                return approximate.then_some(to1);
            }
            if from2 > line {
                break;
            }
            result += (to2 - to1) as isize - (from2 - from1) as isize;
        }
        Some(result.max(0) as usize)
    }

    /// Baseline text of `range`, without the trailing newline.
    pub fn vcs_content(&self, range: &Range) -> TrackerResult<String> {
        let state = self.lock();
        let live = self.live_range(&state, range)?;
        let span = state
            .baseline
            .text_range_of_lines(live.vcs_line1(), live.vcs_line2());
        Ok(state.baseline.text_between(span.start, span.end).into_owned())
    }

    /// Byte span of `range` in the baseline.
    pub fn vcs_text_range(&self, range: &Range) -> TrackerResult<ops::Range<usize>> {
        let state = self.lock();
        let live = self.live_range(&state, range)?;
        Ok(state
            .baseline
            .text_range_of_lines(live.vcs_line1(), live.vcs_line2()))
    }

    /// Current text of `range` in `document`, without the trailing newline.
    pub fn current_content<D: Document + ?Sized>(
        &self,
        document: &D,
        range: &Range,
    ) -> TrackerResult<String> {
        let span = self.current_text_range(document, range)?;
        Ok(document.text_between(span.start, span.end).into_owned())
    }

    /// Byte span of `range` in `document`.
    pub fn current_text_range<D: Document + ?Sized>(
        &self,
        document: &D,
        range: &Range,
    ) -> TrackerResult<ops::Range<usize>> {
        let state = self.lock();
        let live = self.live_range(&state, range)?;
        if live.line2() > document.line_count() {
            return Err(TrackerError::invalid_range(live.line1(), live.line2()));
        }
        Ok(document.text_range_of_lines(live.line1(), live.line2()))
    }

    /// The tracked version of `range`, which may have been shifted since the
    /// caller copied it.
    fn live_range<'s>(
        &self,
        state: &'s TrackerState<H>,
        range: &Range,
    ) -> TrackerResult<&'s Range> {
        if let Some(reason) = self.unanswerable(state) {
            return Err(TrackerError::unavailable(reason));
        }
        state
            .find(range.id())
            .ok_or_else(|| TrackerError::invalid_range(range.line1(), range.line2()))
    }
}
