use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Line diff algorithm used by the default diff primitive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffAlgorithm {
    #[default]
    Myers,
    Patience,
    Lcs,
}

/// One configuration layer as written in `line-status.toml` or passed as a
/// JSON override. Absent fields fall through to lower layers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerConfig {
    /// Compute inner ranges for each block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refine_inner_ranges: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<DiffAlgorithm>,

    /// Largest number of differing lines (both sides together) to diff
    /// before giving up with "too big to diff"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_diff_lines: Option<usize>,

    /// Deadline for one diff in milliseconds; 0 disables the deadline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff_timeout_ms: Option<u64>,
}

/// Fully resolved tracker settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerSettings {
    pub refine_inner_ranges: bool,
    pub algorithm: DiffAlgorithm,
    pub max_diff_lines: usize,
    pub diff_timeout: Option<Duration>,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self::from(super::defaults::default_config())
    }
}

impl From<TrackerConfig> for TrackerSettings {
    fn from(config: TrackerConfig) -> Self {
        let defaults = super::defaults::default_config();
        let timeout_ms = config
            .diff_timeout_ms
            .or(defaults.diff_timeout_ms)
            .unwrap_or_default();
        Self {
            refine_inner_ranges: config
                .refine_inner_ranges
                .or(defaults.refine_inner_ranges)
                .unwrap_or_default(),
            algorithm: config
                .algorithm
                .or(defaults.algorithm)
                .unwrap_or_default(),
            max_diff_lines: config
                .max_diff_lines
                .or(defaults.max_diff_lines)
                .unwrap_or(super::defaults::DEFAULT_MAX_DIFF_LINES),
            diff_timeout: (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms)),
        }
    }
}

impl TrackerSettings {
    /// True when switching from `self` to `other` invalidates computed ranges.
    pub fn requires_rebuild(&self, other: &TrackerSettings) -> bool {
        self != other
    }
}
