//! Shared helpers for tracker integration tests.

#![allow(dead_code)]

use line_status::diff::{RangeBuilder, SimilarLineDiff};
use line_status::document::{Document, EditEvent, TextDocument};
use line_status::tracker::{Highlighter, LineStatusTracker, Range, RangeKind};
use line_status::TrackerSettings;
use line_status::config::DiffAlgorithm;

/// Highlighter that counts what the tracker asked of it.
#[derive(Debug, Default)]
pub struct RecordingHighlighter {
    pub live: usize,
    pub installed: usize,
    pub disposed: usize,
    pub too_big: Vec<bool>,
    pub unchanged: usize,
    next_handle: u64,
}

impl Highlighter for RecordingHighlighter {
    type Handle = u64;

    fn install(&mut self, _range: &Range) -> u64 {
        self.installed += 1;
        self.live += 1;
        self.next_handle += 1;
        self.next_handle
    }

    fn dispose(&mut self, _handle: u64) {
        self.disposed += 1;
        self.live -= 1;
    }

    fn too_big_to_diff(&mut self, too_big: bool) {
        self.too_big.push(too_big);
    }

    fn file_unchanged(&mut self) {
        self.unchanged += 1;
    }
}

pub type Tracker = LineStatusTracker<RecordingHighlighter>;

/// A tracker whose baseline is `baseline` and whose buffer is `document`.
pub fn tracker_for(baseline: &str, document: &TextDocument) -> Tracker {
    tracker_with_settings(baseline, document, TrackerSettings::default())
}

pub fn tracker_with_settings(
    baseline: &str,
    document: &TextDocument,
    settings: TrackerSettings,
) -> Tracker {
    let tracker = LineStatusTracker::new(RecordingHighlighter::default(), settings);
    tracker.ui().unwrap().set_baseline(document, baseline);
    tracker
}

/// Replace `old_len` bytes at `offset` through the tracker.
pub fn replace(tracker: &Tracker, document: &mut TextDocument, offset: usize, old_len: usize, text: &str) {
    let old_text = document.text()[offset..offset + old_len].to_string();
    tracker
        .ui()
        .unwrap()
        .edit(document, &EditEvent::new(offset, old_text, text))
        .unwrap();
}

pub fn flushed_ranges(tracker: &Tracker, document: &TextDocument) -> Vec<Range> {
    tracker.ui().unwrap().synced(document).ranges().unwrap()
}

/// Ranges computed from scratch, for comparison with incremental results.
pub fn full_rebuild(document: &TextDocument, baseline: &str) -> Vec<Range> {
    let differ = SimilarLineDiff::default();
    RangeBuilder::new(&differ, false)
        .build_full(document, &TextDocument::new(baseline))
        .unwrap()
}

pub fn keys(ranges: &[Range]) -> Vec<(usize, usize, usize, usize, RangeKind)> {
    ranges.iter().map(Range::key).collect()
}

/// One line per range: `kind line1..line2 vcs vcs_line1..vcs_line2`.
pub fn render(ranges: &[Range]) -> String {
    ranges
        .iter()
        .map(|range| {
            format!(
                "{} {}..{} vcs {}..{}",
                range.kind(),
                range.line1(),
                range.line2(),
                range.vcs_line1(),
                range.vcs_line2()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Settings using `algorithm` for every diff.
pub fn with_algorithm(algorithm: DiffAlgorithm) -> TrackerSettings {
    TrackerSettings {
        algorithm,
        ..TrackerSettings::default()
    }
}

/// `count` distinct lines `l0`, `l1`, ...
pub fn numbered_lines(count: usize) -> String {
    (0..count)
        .map(|i| format!("l{i}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Byte offset of the start of `line`.
pub fn offset_of_line(document: &TextDocument, line: usize) -> usize {
    document.line_start_offset(line)
}

/// Assert that `ranges` are sorted and disjoint on both sides, that the
/// lines between them are equal in both texts, and that replacing each
/// range with its baseline lines reproduces `baseline`.
pub fn assert_consistent(ranges: &[Range], document: &TextDocument, baseline: &str) {
    let baseline = TextDocument::new(baseline);
    let current_lines = document.lines(0, document.line_count());
    let vcs_lines = baseline.lines(0, baseline.line_count());
    let context = || format!("{}\non {:?}", render(ranges), document.text());

    let (mut line, mut vcs_line) = (0, 0);
    let mut rebuilt: Vec<String> = Vec::new();
    for range in ranges {
        assert!(
            range.line1() >= line && range.vcs_line1() >= vcs_line,
            "unsorted or overlapping ranges:\n{}",
            context()
        );
        assert_eq!(
            &current_lines[line..range.line1()],
            &vcs_lines[vcs_line..range.vcs_line1()],
            "lines between ranges differ:\n{}",
            context()
        );
        rebuilt.extend_from_slice(&current_lines[line..range.line1()]);
        rebuilt.extend_from_slice(&vcs_lines[range.vcs_line1()..range.vcs_line2()]);
        line = range.line2();
        vcs_line = range.vcs_line2();
    }
    assert_eq!(
        &current_lines[line..],
        &vcs_lines[vcs_line..],
        "trailing lines differ:\n{}",
        context()
    );
    rebuilt.extend_from_slice(&current_lines[line..]);
    assert_eq!(rebuilt, vcs_lines, "{}", context());
}

/// Deterministic linear congruential generator yielding values below `bound`.
pub fn lcg(mut seed: u64) -> impl FnMut(usize) -> usize {
    move |bound: usize| {
        seed = seed
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        ((seed >> 33) as usize) % bound
    }
}

/// Text with repeated and blank lines, where diffs are ambiguous.
pub const REPETITIVE: &str = "a\nb\n\nc\na\n  \nd\na\nb\n\nc\na";

/// Apply `edits` random replacements built from repeated pieces and newlines.
pub fn scramble(
    tracker: &Tracker,
    document: &mut TextDocument,
    next: &mut impl FnMut(usize) -> usize,
    edits: usize,
) {
    const PIECES: [&str; 8] = ["a", "b", "\n", "a\n", "\nb", "  ", "\n\n", ""];
    for _ in 0..edits {
        let len = document.len();
        let offset = next(len + 1);
        let removed = next(4).min(len - offset);
        let text = PIECES[next(PIECES.len())];
        replace(tracker, document, offset, removed, text);
    }
}
