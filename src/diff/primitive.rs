use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

use similar::{Algorithm, DiffTag, capture_diff_slices_deadline};
use thiserror::Error;

use crate::config::{DiffAlgorithm, TrackerSettings};
use crate::text::fnv1a_hash;

/// A maximal block of differing lines.
///
/// `before_start..before_start + deleted` in the old sequence is replaced by
/// `after_start..after_start + inserted` in the new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Change {
    pub before_start: usize,
    pub after_start: usize,
    pub deleted: usize,
    pub inserted: usize,
}

impl Change {
    pub fn before_end(&self) -> usize {
        self.before_start + self.deleted
    }

    pub fn after_end(&self) -> usize {
        self.after_start + self.inserted
    }
}

/// Reasons a diff gives up instead of producing changes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiffError {
    #[error("Input has {lines} lines, limit is {limit}")]
    TooLarge { lines: usize, limit: usize },

    #[error("Diff did not finish within {limit_ms}ms")]
    Timeout { limit_ms: u128 },
}

/// Minimal line diff between two sequences.
///
/// Implementations return changes sorted by position, non-overlapping and
/// separated by at least one equal line.
pub trait LineDiff: Send + Sync {
    fn diff(&self, before: &[&str], after: &[&str]) -> Result<Vec<Change>, DiffError>;
}

/// [`LineDiff`] backed by the `similar` crate.
///
/// Lines are compared through a precomputed FNV-1a hash, so the diff
/// algorithm mostly compares integers.
#[derive(Debug, Clone)]
pub struct SimilarLineDiff {
    algorithm: Algorithm,
    max_lines: usize,
    timeout: Option<Duration>,
}

impl Default for SimilarLineDiff {
    fn default() -> Self {
        Self::from_settings(&TrackerSettings::default())
    }
}

impl SimilarLineDiff {
    pub fn new(algorithm: Algorithm, max_lines: usize, timeout: Option<Duration>) -> Self {
        Self {
            algorithm,
            max_lines,
            timeout,
        }
    }

    pub fn from_settings(settings: &TrackerSettings) -> Self {
        let algorithm = match settings.algorithm {
            DiffAlgorithm::Myers => Algorithm::Myers,
            DiffAlgorithm::Patience => Algorithm::Patience,
            DiffAlgorithm::Lcs => Algorithm::Lcs,
        };
        Self::new(algorithm, settings.max_diff_lines, settings.diff_timeout)
    }
}

impl LineDiff for SimilarLineDiff {
    fn diff(&self, before: &[&str], after: &[&str]) -> Result<Vec<Change>, DiffError> {
        // Common prefix and suffix are cheap to strip and do not count
        // towards the size limit.
        let prefix = before
            .iter()
            .zip(after)
            .take_while(|(old, new)| old == new)
            .count();
        let suffix = before[prefix..]
            .iter()
            .rev()
            .zip(after[prefix..].iter().rev())
            .take_while(|(old, new)| old == new)
            .count();
        let before_mid = &before[prefix..before.len() - suffix];
        let after_mid = &after[prefix..after.len() - suffix];

        if before_mid.is_empty() && after_mid.is_empty() {
            return Ok(Vec::new());
        }
        if before_mid.is_empty() || after_mid.is_empty() {
            return Ok(vec![Change {
                before_start: prefix,
                after_start: prefix,
                deleted: before_mid.len(),
                inserted: after_mid.len(),
            }]);
        }

        let lines = before_mid.len() + after_mid.len();
        if lines > self.max_lines {
            return Err(DiffError::TooLarge {
                lines,
                limit: self.max_lines,
            });
        }

        let old_keys: Vec<LineKey<'_>> = before_mid.iter().map(|line| LineKey::new(line)).collect();
        let new_keys: Vec<LineKey<'_>> = after_mid.iter().map(|line| LineKey::new(line)).collect();

        let started = Instant::now();
        let deadline = self.timeout.map(|timeout| started + timeout);
        let ops = capture_diff_slices_deadline(self.algorithm, &old_keys, &new_keys, deadline);
        if let Some(timeout) = self.timeout
            && started.elapsed() > timeout
        {
            return Err(DiffError::Timeout {
                limit_ms: timeout.as_millis(),
            });
        }

        // Positions come from running cursors. The indices `similar` reports
        // for an op after a replacement can lag behind the real position.
        let mut changes: Vec<Change> = Vec::new();
        let mut old_cursor = prefix;
        let mut new_cursor = prefix;
        for op in ops {
            let (tag, old_range, new_range) = op.as_tag_tuple();
            let before_start = old_cursor;
            let after_start = new_cursor;
            old_cursor += old_range.len();
            new_cursor += new_range.len();
            if tag == DiffTag::Equal {
                continue;
            }

            // similar reports a replacement as adjacent delete and insert ops
            match changes.last_mut() {
                Some(last)
                    if last.before_end() == before_start && last.after_end() == after_start =>
                {
                    last.deleted += old_range.len();
                    last.inserted += new_range.len();
                }
                _ => changes.push(Change {
                    before_start,
                    after_start,
                    deleted: old_range.len(),
                    inserted: new_range.len(),
                }),
            }
        }
        debug_assert_eq!(old_cursor, before.len() - suffix);
        debug_assert_eq!(new_cursor, after.len() - suffix);
        debug_assert!(changes.windows(2).all(|pair| {
            pair[0].before_end() < pair[1].before_start && pair[0].after_end() < pair[1].after_start
        }));
        Ok(changes)
    }
}

/// A line paired with its hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct LineKey<'a> {
    hash: u64,
    text: &'a str,
}

impl<'a> LineKey<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            hash: fnv1a_hash(text),
            text,
        }
    }
}

impl Hash for LineKey<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn change(before_start: usize, after_start: usize, deleted: usize, inserted: usize) -> Change {
        Change {
            before_start,
            after_start,
            deleted,
            inserted,
        }
    }

    fn differ() -> SimilarLineDiff {
        SimilarLineDiff::new(Algorithm::Myers, 1000, None)
    }

    #[test]
    fn test_identical_inputs_have_no_changes() {
        let lines = ["a", "b", "c"];
        assert_eq!(differ().diff(&lines, &lines), Ok(vec![]));
    }

    #[rstest]
    #[case::modified_middle(&["a", "b", "c"], &["a", "x", "c"], vec![change(1, 1, 1, 1)])]
    #[case::appended(&["a", "b", "c"], &["a", "b", "c", "d"], vec![change(3, 3, 0, 1)])]
    #[case::removed_first(&["a", "b", "c"], &["b", "c"], vec![change(0, 0, 1, 0)])]
    #[case::two_blocks(
        &["a", "b", "c", "d", "e"],
        &["a", "x", "c", "d", "y", "z"],
        vec![change(1, 1, 1, 1), change(4, 4, 1, 2)]
    )]
    #[case::everything_replaced(&["a", "b"], &["x", "y", "z"], vec![change(0, 0, 2, 3)])]
    fn test_diff_reports_merged_blocks(
        #[case] before: &[&str],
        #[case] after: &[&str],
        #[case] expected: Vec<Change>,
    ) {
        assert_eq!(differ().diff(before, after), Ok(expected));
    }

    #[rstest]
    #[case::myers(Algorithm::Myers)]
    #[case::patience(Algorithm::Patience)]
    #[case::lcs(Algorithm::Lcs)]
    fn test_every_algorithm_finds_single_modification(#[case] algorithm: Algorithm) {
        let differ = SimilarLineDiff::new(algorithm, 1000, None);
        let changes = differ
            .diff(&["a", "b", "c", "d"], &["a", "b", "X", "d"])
            .unwrap();
        assert_eq!(changes, vec![change(2, 2, 1, 1)]);
    }

    /// Replays `changes` onto `before` and checks they are ordered and disjoint.
    fn apply(before: &[&str], after: &[&str], changes: &[Change]) -> Vec<String> {
        for pair in changes.windows(2) {
            assert!(pair[0].before_end() < pair[1].before_start, "{changes:?}");
            assert!(pair[0].after_end() < pair[1].after_start, "{changes:?}");
        }
        let mut out = Vec::new();
        let (mut cursor, mut after_cursor) = (0, 0);
        for change in changes {
            assert_eq!(
                change.before_start - cursor,
                change.after_start - after_cursor,
                "equal runs differ in {changes:?}"
            );
            out.extend(before[cursor..change.before_start].iter().map(|line| line.to_string()));
            out.extend(after[change.after_start..change.after_end()].iter().map(|line| line.to_string()));
            cursor = change.before_end();
            after_cursor = change.after_end();
        }
        out.extend(before[cursor..].iter().map(|line| line.to_string()));
        out
    }

    #[rstest]
    #[case::myers(Algorithm::Myers)]
    #[case::patience(Algorithm::Patience)]
    #[case::lcs(Algorithm::Lcs)]
    fn test_changes_stay_ordered_with_repeated_and_blank_lines(#[case] algorithm: Algorithm) {
        let differ = SimilarLineDiff::new(algorithm, 1000, None);
        let cases: [(&[&str], &[&str]); 4] = [
            (
                &["a", "b", "", "c", "a", "  ", "d", "a", "b", "", "c", "a"],
                &["a", "b", "", "c", "a", "  ", "d", "a", "", "b", "c", "a"],
            ),
            (
                &["a", "b", "", "c", "a", "  ", "d", "a", "b", "", "c", "a"],
                &["x", "a", "a", "", "b", "c", "", "a", "d", "a", "a"],
            ),
            (&["a", "a", "b", "a", "a"], &["b", "a", "a", "a", "b"]),
            (&["", "", "a", "", ""], &["a", "", "", "", "a", ""]),
        ];
        for (before, after) in cases {
            let changes = differ.diff(before, after).unwrap();
            assert_eq!(apply(before, after, &changes), after, "{changes:?}");
        }
    }

    #[test]
    fn test_limit_applies_to_differing_middle_only() {
        let differ = SimilarLineDiff::new(Algorithm::Myers, 4, None);
        let before: Vec<&str> = vec!["same"; 50];
        let mut after = before.clone();
        after[25] = "changed";

        assert_eq!(differ.diff(&before, &after), Ok(vec![change(25, 25, 1, 1)]));
    }

    #[test]
    fn test_too_large_middle_is_rejected() {
        let differ = SimilarLineDiff::new(Algorithm::Myers, 3, None);
        let result = differ.diff(&["a", "b", "c"], &["x", "y", "z"]);
        assert_eq!(result, Err(DiffError::TooLarge { lines: 6, limit: 3 }));
    }

    #[test]
    fn test_pure_insertion_skips_limit() {
        let differ = SimilarLineDiff::new(Algorithm::Myers, 1, None);
        let result = differ.diff(&["a"], &["a", "b", "c", "d"]);
        assert_eq!(result, Ok(vec![change(1, 1, 0, 3)]));
    }

    #[test]
    fn test_from_settings_uses_configured_limit() {
        let settings = TrackerSettings {
            max_diff_lines: 2,
            ..TrackerSettings::default()
        };
        let differ = SimilarLineDiff::from_settings(&settings);
        assert!(matches!(
            differ.diff(&["a", "b"], &["c", "d"]),
            Err(DiffError::TooLarge { .. })
        ));
    }
}
