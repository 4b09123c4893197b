//! Turns line diffs into [`Range`] lists.

use super::{Change, DiffError, LineDiff};
use crate::document::Document;
use crate::tracker::{InnerRange, Range, RangeKind};

/// Builds ranges for a slice of the current buffer against a slice of the
/// baseline.
pub struct RangeBuilder<'a> {
    differ: &'a dyn LineDiff,
    refine_inner_ranges: bool,
}

impl<'a> RangeBuilder<'a> {
    pub fn new(differ: &'a dyn LineDiff, refine_inner_ranges: bool) -> Self {
        Self {
            differ,
            refine_inner_ranges,
        }
    }

    /// Diff every line of `current` against every line of `baseline`.
    pub fn build_full<C, B>(&self, current: &C, baseline: &B) -> Result<Vec<Range>, DiffError>
    where
        C: Document + ?Sized,
        B: Document + ?Sized,
    {
        let current_lines = current.lines(0, current.line_count());
        let vcs_lines = baseline.lines(0, baseline.line_count());
        self.build(&as_strs(&current_lines), &as_strs(&vcs_lines), 0, 0)
    }

    /// Diff `vcs` (baseline lines) into `current` and return the change
    /// blocks, translated by `current_offset` / `vcs_offset`.
    pub fn build(
        &self,
        current: &[&str],
        vcs: &[&str],
        current_offset: usize,
        vcs_offset: usize,
    ) -> Result<Vec<Range>, DiffError> {
        self.differ
            .diff(vcs, current)?
            .into_iter()
            .map(|change| {
                let line1 = current_offset + change.after_start;
                let vcs_line1 = vcs_offset + change.before_start;
                let block_current = &current[change.after_start..change.after_end()];
                let block_vcs = &vcs[change.before_start..change.before_end()];
                self.block(
                    line1,
                    line1 + change.inserted,
                    vcs_line1,
                    vcs_line1 + change.deleted,
                    block_current,
                    block_vcs,
                )
            })
            .collect()
    }

    /// A single block whose lines are already known to differ.
    ///
    /// Every block gets inner ranges: one spanning the block, or the refined
    /// tiling of a modification when refinement is on. `current` and `vcs`
    /// are the block's lines and are only read when refining.
    pub fn block(
        &self,
        line1: usize,
        line2: usize,
        vcs_line1: usize,
        vcs_line2: usize,
        current: &[&str],
        vcs: &[&str],
    ) -> Result<Range, DiffError> {
        let range = Range::new(line1, line2, vcs_line1, vcs_line2);
        let inner_ranges = match range.kind() {
            RangeKind::Modified if self.refine_inner_ranges => {
                self.refine(line1, vcs_line1, current, vcs)?
            }
            kind => vec![InnerRange::new(line1, line2, vcs_line1, vcs_line2, kind)],
        };
        Ok(range.with_inner_ranges(inner_ranges))
    }

    /// Tile a modified block with inner ranges, comparing lines with
    /// surrounding whitespace ignored.
    fn refine(
        &self,
        line1: usize,
        vcs_line1: usize,
        current: &[&str],
        vcs: &[&str],
    ) -> Result<Vec<InnerRange>, DiffError> {
        let trimmed_current: Vec<&str> = current.iter().map(|line| line.trim()).collect();
        let trimmed_vcs: Vec<&str> = vcs.iter().map(|line| line.trim()).collect();
        let changes = self.differ.diff(&trimmed_vcs, &trimmed_current)?;

        let mut inner_ranges = Vec::with_capacity(changes.len() * 2 + 1);
        let mut after = 0;
        let mut before = 0;
        let mut push = |after1: usize, after2: usize, before1: usize, before2: usize, kind| {
            inner_ranges.push(InnerRange::new(
                line1 + after1,
                line1 + after2,
                vcs_line1 + before1,
                vcs_line1 + before2,
                kind,
            ));
        };
        for Change {
            before_start,
            after_start,
            deleted,
            inserted,
        } in changes
        {
            if after_start > after || before_start > before {
                push(after, after_start, before, before_start, RangeKind::Equal);
            }
            let kind = RangeKind::of_change(0, inserted, 0, deleted);
            push(
                after_start,
                after_start + inserted,
                before_start,
                before_start + deleted,
                kind,
            );
            after = after_start + inserted;
            before = before_start + deleted;
        }
        if after < current.len() || before < vcs.len() {
            push(after, current.len(), before, vcs.len(), RangeKind::Equal);
        }
        Ok(inner_ranges)
    }
}

/// Borrow owned lines as the `&str` slices [`LineDiff`] takes.
pub fn as_strs(lines: &[String]) -> Vec<&str> {
    lines.iter().map(String::as_str).collect()
}
