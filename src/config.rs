//! Tracker configuration.
//!
//! Settings come from four layers, later ones winning field by field:
//! programmed defaults, the user config file, the project's
//! `line-status.toml`, and an explicit override.

pub mod defaults;
pub mod layers;
mod settings;
pub mod user;

pub use defaults::default_config;
pub use layers::{SettingsEvent, SettingsEventKind, SettingsLoadOutcome, load_settings};
pub use settings::{DiffAlgorithm, TrackerConfig, TrackerSettings};
pub use user::{UserConfigError, UserConfigResult, load_user_config, user_config_path};

/// Fold configuration layers from lowest to highest precedence.
pub fn merge_all(configs: &[Option<TrackerConfig>]) -> Option<TrackerConfig> {
    configs.iter().cloned().reduce(merge_settings).flatten()
}

/// Merge two layers, preferring values from `primary` over `fallback`.
pub fn merge_settings(
    fallback: Option<TrackerConfig>,
    primary: Option<TrackerConfig>,
) -> Option<TrackerConfig> {
    match (fallback, primary) {
        (None, None) => None,
        (Some(config), None) | (None, Some(config)) => Some(config),
        (Some(fallback), Some(primary)) => Some(TrackerConfig {
            refine_inner_ranges: primary.refine_inner_ranges.or(fallback.refine_inner_ranges),
            algorithm: primary.algorithm.or(fallback.algorithm),
            max_diff_lines: primary.max_diff_lines.or(fallback.max_diff_lines),
            diff_timeout_ms: primary.diff_timeout_ms.or(fallback.diff_timeout_ms),
        }),
    }
}
