//! Diff blocks between the current buffer and the baseline.

use std::fmt;

/// What a block does to the baseline, derived from which intervals are empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeKind {
    /// Unchanged lines; only appears inside inner ranges
    Equal,
    /// Lines present only in the current buffer
    Inserted,
    /// Lines present only in the baseline
    Deleted,
    /// Lines replaced by different lines
    Modified,
}

impl RangeKind {
    /// Classify a change block by the emptiness of its two intervals.
    pub fn of_change(line1: usize, line2: usize, vcs_line1: usize, vcs_line2: usize) -> Self {
        match (line1 == line2, vcs_line1 == vcs_line2) {
            (true, true) => RangeKind::Equal,
            (false, true) => RangeKind::Inserted,
            (true, false) => RangeKind::Deleted,
            (false, false) => RangeKind::Modified,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RangeKind::Equal => "equal",
            RangeKind::Inserted => "inserted",
            RangeKind::Deleted => "deleted",
            RangeKind::Modified => "modified",
        }
    }
}

impl fmt::Display for RangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a range installed in a tracker.
///
/// Ids are never reused, so a range copy whose id is no longer present in the
/// tracker has been superseded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct RangeId(u64);

impl RangeId {
    /// Id carried by ranges that have not been installed yet.
    pub const DETACHED: RangeId = RangeId(0);

    pub(crate) fn new(raw: u64) -> Self {
        RangeId(raw)
    }

    pub fn is_detached(self) -> bool {
        self == Self::DETACHED
    }
}

/// Line-granular refinement of a range.
///
/// Inner ranges of one range tile it without gaps; `Equal` entries mark lines
/// that only differ in surrounding whitespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InnerRange {
    pub line1: usize,
    pub line2: usize,
    pub vcs_line1: usize,
    pub vcs_line2: usize,
    pub kind: RangeKind,
}

impl InnerRange {
    pub fn new(
        line1: usize,
        line2: usize,
        vcs_line1: usize,
        vcs_line2: usize,
        kind: RangeKind,
    ) -> Self {
        Self {
            line1,
            line2,
            vcs_line1,
            vcs_line2,
            kind,
        }
    }
}

/// One contiguous diff block.
///
/// `[line1, line2)` is the half-open interval in the current buffer and
/// `[vcs_line1, vcs_line2)` the one in the baseline. Equality ignores the id.
#[derive(Debug, Clone, Eq)]
pub struct Range {
    line1: usize,
    line2: usize,
    vcs_line1: usize,
    vcs_line2: usize,
    inner_ranges: Option<Vec<InnerRange>>,
    id: RangeId,
}

impl PartialEq for Range {
    fn eq(&self, other: &Self) -> bool {
        self.line1 == other.line1
            && self.line2 == other.line2
            && self.vcs_line1 == other.vcs_line1
            && self.vcs_line2 == other.vcs_line2
            && self.inner_ranges == other.inner_ranges
    }
}

impl Range {
    /// Create a detached range.
    ///
    /// # Panics
    ///
    /// Panics in debug builds when an interval is reversed.
    pub fn new(line1: usize, line2: usize, vcs_line1: usize, vcs_line2: usize) -> Self {
        debug_assert!(line1 <= line2, "reversed current interval {line1}..{line2}");
        debug_assert!(
            vcs_line1 <= vcs_line2,
            "reversed baseline interval {vcs_line1}..{vcs_line2}"
        );
        Self {
            line1,
            line2,
            vcs_line1,
            vcs_line2,
            inner_ranges: None,
            id: RangeId::DETACHED,
        }
    }

    pub fn with_inner_ranges(mut self, inner_ranges: Vec<InnerRange>) -> Self {
        self.inner_ranges = Some(inner_ranges);
        self
    }

    pub fn line1(&self) -> usize {
        self.line1
    }

    pub fn line2(&self) -> usize {
        self.line2
    }

    pub fn vcs_line1(&self) -> usize {
        self.vcs_line1
    }

    pub fn vcs_line2(&self) -> usize {
        self.vcs_line2
    }

    pub fn kind(&self) -> RangeKind {
        RangeKind::of_change(self.line1, self.line2, self.vcs_line1, self.vcs_line2)
    }

    pub fn inner_ranges(&self) -> Option<&[InnerRange]> {
        self.inner_ranges.as_deref()
    }

    pub fn id(&self) -> RangeId {
        self.id
    }

    /// `(line1, line2, vcs_line1, vcs_line2, kind)`, the identity of a block
    /// independent of inner ranges and installation.
    pub fn key(&self) -> (usize, usize, usize, usize, RangeKind) {
        (
            self.line1,
            self.line2,
            self.vcs_line1,
            self.vcs_line2,
            self.kind(),
        )
    }

    /// Whether a caret on `line` is considered to be on this range.
    ///
    /// Deleted ranges have no lines of their own and are selected by the line
    /// right after the deletion point.
    pub fn is_selected_by_line(&self, line: usize) -> bool {
        if self.line1 == self.line2 {
            line == self.line1
        } else {
            self.line1 <= line && line < self.line2
        }
    }

    pub(crate) fn set_id(&mut self, id: RangeId) {
        self.id = id;
    }

    /// Move the current-buffer interval (and inner ranges) by `delta` lines.
    pub(crate) fn shift(&mut self, delta: isize) {
        self.line1 = shift_line(self.line1, delta);
        self.line2 = shift_line(self.line2, delta);
        if let Some(inner_ranges) = self.inner_ranges.as_mut() {
            for inner in inner_ranges {
                inner.line1 = shift_line(inner.line1, delta);
                inner.line2 = shift_line(inner.line2, delta);
            }
        }
    }
}

/// Apply a signed line delta, clamping at 0.
pub(crate) fn shift_line(line: usize, delta: isize) -> usize {
    line.saturating_add_signed(delta)
}
