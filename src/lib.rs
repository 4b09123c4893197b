//! Incremental line-level diff tracking between an edited buffer and a
//! baseline text.
//!
//! ```
//! use line_status::config::TrackerSettings;
//! use line_status::document::{EditEvent, TextDocument};
//! use line_status::tracker::{LineStatusTracker, NoopHighlighter, RangeKind};
//!
//! let mut document = TextDocument::new("a\nb\nc");
//! let tracker = LineStatusTracker::new(NoopHighlighter, TrackerSettings::default());
//! let ui = tracker.ui().unwrap();
//! ui.set_baseline(&document, "a\nb\nc");
//!
//! ui.edit(&mut document, &EditEvent::new(2, "b", "x")).unwrap();
//! let ranges = ui.synced(&document).ranges().unwrap();
//!
//! assert_eq!(ranges.len(), 1);
//! assert_eq!(ranges[0].kind(), RangeKind::Modified);
//! ```

pub mod config;
pub mod diff;
pub mod document;
pub mod error;
pub mod text;
pub mod tracker;

pub use config::TrackerSettings;
pub use document::{Document, EditEvent, TextDocument};
pub use error::{TrackerError, TrackerResult};
pub use tracker::{Highlighter, LineStatusTracker, Range, RangeKind, TrackerUi};
