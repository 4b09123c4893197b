//! Programmed defaults, the lowest configuration layer.
//!
//! Also used by `config init` to print a template.

use super::settings::{DiffAlgorithm, TrackerConfig};

pub const DEFAULT_MAX_DIFF_LINES: usize = 20_000;
pub const DEFAULT_DIFF_TIMEOUT_MS: u64 = 1_000;

/// Returns the default configuration with every field populated.
pub fn default_config() -> TrackerConfig {
    TrackerConfig {
        refine_inner_ranges: Some(false),
        algorithm: Some(DiffAlgorithm::Myers),
        max_diff_lines: Some(DEFAULT_MAX_DIFF_LINES),
        diff_timeout_ms: Some(DEFAULT_DIFF_TIMEOUT_MS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes_every_field() {
        let toml = toml::to_string_pretty(&default_config()).unwrap();
        insta::assert_snapshot!(toml, @r#"
        refineInnerRanges = false
        algorithm = "myers"
        maxDiffLines = 20000
        diffTimeoutMs = 1000
        "#);
    }

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let toml = toml::to_string_pretty(&default_config()).unwrap();
        let parsed: TrackerConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, default_config());
    }
}
