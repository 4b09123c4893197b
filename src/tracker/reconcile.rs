//! Incremental reconciliation of ranges against a dirty region.
//!
//! Only the ranges intersecting the dirty region (plus neighbours separated
//! from it by blank lines only) are recomputed. Ranges after the region are
//! shifted, ranges before it are untouched.

use super::range::shift_line;
use super::state::TrackerState;
use super::{Highlighter, Range};
use crate::diff::DiffError;
use crate::diff::builder::as_strs;
use crate::document::Document;
use crate::error::{TrackerError, TrackerResult};

/// Split of the range list around a dirty span.
///
/// `ranges[..before_end]` lie strictly above the span,
/// `ranges[before_end..after_start]` are affected and
/// `ranges[after_start..]` lie strictly below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Partition {
    pub before_end: usize,
    pub after_start: usize,
}

impl<H: Highlighter> TrackerState<H> {
    /// Apply the pending dirty region, if any.
    ///
    /// Any internal failure falls back to a full rebuild.
    pub(super) fn update_ranges<D: Document + ?Sized>(&mut self, document: &D) {
        if self.is_suppressed() {
            return;
        }
        if self.take_rebuild_request() {
            self.reinstall_ranges(document);
            return;
        }
        let Some(region) = self.dirty.take() else {
            return;
        };
        if let Err(err) = self.update_span(
            document,
            region.line1,
            region.line2,
            region.line_shift,
            region.total_lines_before,
        ) {
            log::error!(
                target: "line_status::reconcile",
                "Reconciliation of {:?} failed, rebuilding: {}",
                region,
                err
            );
            self.reinstall_ranges(document);
        }
    }

    /// Recompute ranges touching `[line1, line2)` (pre-edit coordinates)
    /// after the buffer gained `shift` lines, starting from
    /// `total_lines_before` lines.
    pub(super) fn update_span<D: Document + ?Sized>(
        &mut self,
        document: &D,
        line1: usize,
        line2: usize,
        shift: isize,
        total_lines_before: usize,
    ) -> TrackerResult<()> {
        let partition = self.partition(document, line1, line2, shift);

        let affected = &self.ranges[partition.before_end..partition.after_start];
        let line1 = affected.first().map_or(line1, |first| first.line1().min(line1));
        let line2 = affected
            .last()
            .map_or(line2, |last| last.line2().max(line2));

        self.splice(document, line1, line2, shift, total_lines_before, partition)?;
        self.check_invariants(document)
    }

    /// Classify ranges as before / affected / after the span, then pull
    /// neighbours separated from the span by blank lines only into the
    /// affected set.
    pub(super) fn partition<D: Document + ?Sized>(
        &self,
        document: &D,
        line1: usize,
        line2: usize,
        shift: isize,
    ) -> Partition {
        let ranges = &self.ranges;
        let mut last_before: Option<usize> = None;
        let mut first_after = ranges.len();
        for (index, range) in ranges.iter().enumerate() {
            if range.line2() < line1 {
                last_before = Some(index);
            } else if range.line1() > line2 {
                first_after = index;
                break;
            }
        }

        while let Some(index) = last_before {
            let mut first_changed_line = line1;
            if let Some(next) = ranges.get(index + 1) {
                first_changed_line = first_changed_line.min(next.line1());
            }
            if !document.is_line_range_blank(ranges[index].line2(), first_changed_line) {
                break;
            }
            last_before = index.checked_sub(1);
        }

        while first_after < ranges.len() {
            let mut first_unchanged_line = shift_line(line2, shift);
            if first_after > 0 {
                first_unchanged_line =
                    first_unchanged_line.max(shift_line(ranges[first_after - 1].line2(), shift));
            }
            let next_line1 = shift_line(ranges[first_after].line1(), shift);
            if !document.is_line_range_blank(first_unchanged_line, next_line1) {
                break;
            }
            first_after += 1;
        }

        Partition {
            before_end: last_before.map_or(0, |index| index + 1),
            after_start: first_after,
        }
    }

    fn splice<D: Document + ?Sized>(
        &mut self,
        document: &D,
        line1: usize,
        line2: usize,
        shift: isize,
        total_lines_before: usize,
        partition: Partition,
    ) -> TrackerResult<()> {
        let Partition {
            before_end,
            after_start,
        } = partition;
        let vcs_total = self.baseline.line_count();

        let after_line1 = line1;
        let after_line2 = line2 as isize + shift;
        let vcs_line1 = match before_end.checked_sub(1).map(|index| &self.ranges[index]) {
            Some(last_before) => {
                line1 as isize + last_before.vcs_line2() as isize - last_before.line2() as isize
            }
            None => line1 as isize,
        };
        let vcs_line2 = match self.ranges.get(after_start) {
            Some(first_after) => {
                line2 as isize + first_after.vcs_line1() as isize - first_after.line1() as isize
            }
            None => vcs_total as isize - total_lines_before as isize + line2 as isize,
        };

        if after_line2 < after_line1 as isize
            || after_line2 > document.line_count() as isize
            || vcs_line1 < 0
            || vcs_line2 < vcs_line1
            || vcs_line2 > vcs_total as isize
        {
            return Err(TrackerError::inconsistent(format!(
                "slice {}..{} vs baseline {}..{} out of bounds ({} / {} lines)",
                after_line1,
                after_line2,
                vcs_line1,
                vcs_line2,
                document.line_count(),
                vcs_total
            )));
        }
        let (after_line2, vcs_line1, vcs_line2) =
            (after_line2 as usize, vcs_line1 as usize, vcs_line2 as usize);

        log::debug!(
            target: "line_status::reconcile",
            "Reconciling lines {}..{} against baseline {}..{} (shift {})",
            after_line1,
            after_line2,
            vcs_line1,
            vcs_line2,
            shift
        );

        let new_ranges = match self.slice_ranges(document, after_line1, after_line2, vcs_line1, vcs_line2) {
            Ok(new_ranges) => new_ranges,
            Err(err) => {
                self.destroy_ranges();
                self.install_too_big(err);
                return Ok(());
            }
        };

        for range in &mut self.ranges[after_start..] {
            range.shift(shift);
        }

        if self.ranges[before_end..after_start] != new_ranges[..] {
            let stamped: Vec<Range> = new_ranges
                .into_iter()
                .map(|range| self.stamp(range))
                .collect();
            let installed: Vec<_> = stamped.iter().map(Range::id).collect();
            let removed: Vec<_> = self
                .ranges
                .splice(before_end..after_start, stamped)
                .map(|range| range.id())
                .collect();
            for id in removed {
                self.schedule_dispose(id);
            }
            for id in installed {
                self.schedule_install(id);
            }
            if self.ranges.is_empty() {
                self.highlighter.file_unchanged();
            }
        }
        Ok(())
    }

    /// Ranges for the current lines `[line1, line2)` against the baseline
    /// lines `[vcs_line1, vcs_line2)`.
    fn slice_ranges<D: Document + ?Sized>(
        &self,
        document: &D,
        line1: usize,
        line2: usize,
        vcs_line1: usize,
        vcs_line2: usize,
    ) -> Result<Vec<Range>, DiffError> {
        if line1 == line2 && vcs_line1 == vcs_line2 {
            return Ok(Vec::new());
        }
        let current = document.lines(line1, line2);
        let vcs = self.baseline.lines(vcs_line1, vcs_line2);
        let (current, vcs) = (as_strs(&current), as_strs(&vcs));
        if line1 == line2 || vcs_line1 == vcs_line2 {
            let range = self
                .builder()
                .block(line1, line2, vcs_line1, vcs_line2, &current, &vcs)?;
            return Ok(vec![range]);
        }
        self.builder().build(&current, &vcs, line1, vcs_line1)
    }

    /// Ranges must be sorted and disjoint on both sides and within bounds.
    fn check_invariants<D: Document + ?Sized>(&self, document: &D) -> TrackerResult<()> {
        for pair in self.ranges.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if prev.line2() > next.line1() || prev.vcs_line2() > next.vcs_line1() {
                return Err(TrackerError::inconsistent(format!(
                    "ranges {:?} and {:?} overlap",
                    prev.key(),
                    next.key()
                )));
            }
        }
        if let Some(last) = self.ranges.last()
            && (last.line2() > document.line_count()
                || last.vcs_line2() > self.baseline.line_count())
        {
            return Err(TrackerError::inconsistent(format!(
                "range {:?} exceeds document bounds",
                last.key()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackerSettings;
    use crate::document::TextDocument;
    use crate::tracker::{NoopHighlighter, RangeKind};

    fn state_for(baseline: &str, current: &TextDocument) -> TrackerState<NoopHighlighter> {
        let mut state = TrackerState::new(NoopHighlighter, &TrackerSettings::default(), None);
        state.set_baseline(current, baseline.to_string());
        state
    }

    #[test]
    fn test_partition_splits_around_span() {
        let baseline = "a\nb\nc\nd\ne\nf\ng";
        let current = TextDocument::new("a\nB\nc\nD\ne\nF\ng");
        let state = state_for(baseline, &current);
        assert_eq!(state.ranges.len(), 3);

        assert_eq!(
            state.partition(&current, 3, 4, 0),
            Partition {
                before_end: 1,
                after_start: 2
            }
        );
    }

    #[test]
    fn test_partition_extends_over_blank_gap() {
        // ranges on lines 1 and 3, separated by a blank line
        let baseline = "a\nb\n\nd\ne";
        let current = TextDocument::new("a\nB\n\nD\ne");
        let state = state_for(baseline, &current);
        assert_eq!(state.ranges.len(), 2);

        // an edit on line 3 pulls in the range on line 1 through the blank line 2
        assert_eq!(
            state.partition(&current, 3, 4, 0),
            Partition {
                before_end: 0,
                after_start: 2
            }
        );
    }

    #[test]
    fn test_update_span_reuses_unchanged_ranges() {
        let mut current = TextDocument::new("a\nB\nc\nd\ne");
        let mut state = state_for("a\nb\nc\nd\ne", &current);
        let first_id = state.ranges[0].id();

        current.replace(8, 1, "E").unwrap();
        state.update_span(&current, 4, 5, 0, 5).unwrap();
        state.update_highlighters();

        let keys: Vec<_> = state.ranges.iter().map(Range::key).collect();
        assert_eq!(
            keys,
            vec![
                (1, 2, 1, 2, RangeKind::Modified),
                (4, 5, 4, 5, RangeKind::Modified)
            ]
        );
        assert_eq!(state.ranges[0].id(), first_id);
        assert_eq!(state.installed_handles(), 2);
    }

    #[test]
    fn test_out_of_bounds_slice_is_inconsistent() {
        let current = TextDocument::new("a\nb");
        let mut state = state_for("a\nb", &current);

        let result = state.update_span(&current, 0, 5, 0, 2);

        assert!(matches!(result, Err(TrackerError::Inconsistent { .. })));
    }
}
