//! Contract between the tracker and whatever renders ranges.

use super::Range;

/// Receives range lifecycle and status notifications from a tracker.
///
/// Calls are made with the tracker's lock held, so implementations must not
/// call back into the tracker.
pub trait Highlighter: Send {
    /// Opaque per-range token returned by [`install`](Self::install) and given
    /// back to [`dispose`](Self::dispose).
    type Handle: Send;

    fn install(&mut self, range: &Range) -> Self::Handle;

    fn dispose(&mut self, handle: Self::Handle);

    /// The buffer could not be diffed (`true`), or can be again (`false`).
    fn too_big_to_diff(&mut self, too_big: bool) {
        let _ = too_big;
    }

    /// The buffer became identical to the baseline.
    fn file_unchanged(&mut self) {}
}

/// A highlighter that renders nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHighlighter;

impl Highlighter for NoopHighlighter {
    type Handle = ();

    fn install(&mut self, _range: &Range) -> Self::Handle {}

    fn dispose(&mut self, _handle: Self::Handle) {}
}

/// Message shown by editors while the buffer is too big to diff.
pub const TOO_BIG_MESSAGE: &str = "File is too big to show changed lines";
