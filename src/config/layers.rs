//! Layered settings loading: defaults < user < project < override.

use std::fs;
use std::path::Path;

use serde_json::Value;

use super::user::CONFIG_FILE_NAME;
use super::{TrackerConfig, TrackerSettings, default_config, load_user_config, merge_all};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingsEventKind {
    Info,
    Warning,
}

/// Something worth telling the user about while settings were loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SettingsEvent {
    pub kind: SettingsEventKind,
    pub message: String,
}

impl SettingsEvent {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: SettingsEventKind::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: SettingsEventKind::Warning,
            message: message.into(),
        }
    }

    /// Forward the event to the `log` facade.
    pub fn log(&self) {
        match self.kind {
            SettingsEventKind::Info => log::info!(target: "line_status::config", "{}", self.message),
            SettingsEventKind::Warning => {
                log::warn!(target: "line_status::config", "{}", self.message)
            }
        }
    }
}

#[derive(Debug)]
pub struct SettingsLoadOutcome {
    pub settings: TrackerSettings,
    pub events: Vec<SettingsEvent>,
}

/// Load settings from every layer.
///
/// Never fails: unreadable or malformed layers are skipped with a warning
/// event and the remaining layers still apply.
pub fn load_settings(root_path: Option<&Path>, override_settings: Option<Value>) -> SettingsLoadOutcome {
    let mut events = Vec::new();

    let defaults = Some(default_config());
    let user_config = load_user_config_with_events(&mut events);
    let project_config = load_project_config(root_path, &mut events);
    let override_config = override_settings.and_then(|value| parse_override(value, &mut events));

    let merged = merge_all(&[defaults, user_config, project_config, override_config]);
    let settings = merged.map(TrackerSettings::from).unwrap_or_default();

    SettingsLoadOutcome { settings, events }
}

/// Load a single configuration file, as given with `--config`.
pub fn load_config_file(path: &Path, events: &mut Vec<SettingsEvent>) -> Option<TrackerConfig> {
    match fs::read_to_string(path) {
        Ok(contents) => match toml::from_str::<TrackerConfig>(&contents) {
            Ok(config) => {
                events.push(SettingsEvent::info(format!(
                    "Loaded config file: {}",
                    path.display()
                )));
                Some(config)
            }
            Err(err) => {
                events.push(SettingsEvent::warning(format!(
                    "Failed to parse {}: {}",
                    path.display(),
                    err
                )));
                None
            }
        },
        Err(err) => {
            events.push(SettingsEvent::warning(format!(
                "Failed to read {}: {}",
                path.display(),
                err
            )));
            None
        }
    }
}

fn load_user_config_with_events(events: &mut Vec<SettingsEvent>) -> Option<TrackerConfig> {
    match load_user_config() {
        Ok(Some(config)) => {
            events.push(SettingsEvent::info("Loaded user config"));
            Some(config)
        }
        Ok(None) => None,
        Err(err) => {
            events.push(SettingsEvent::warning(format!(
                "Failed to load user config: {}",
                err
            )));
            None
        }
    }
}

fn load_project_config(
    root_path: Option<&Path>,
    events: &mut Vec<SettingsEvent>,
) -> Option<TrackerConfig> {
    let config_path = root_path?.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        return None;
    }
    load_config_file(&config_path, events)
}

fn parse_override(value: Value, events: &mut Vec<SettingsEvent>) -> Option<TrackerConfig> {
    match serde_json::from_value::<TrackerConfig>(value) {
        Ok(config) => {
            events.push(SettingsEvent::info("Applied settings override"));
            Some(config)
        }
        Err(err) => {
            events.push(SettingsEvent::warning(format!(
                "Failed to parse settings override: {}",
                err
            )));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DiffAlgorithm;
    use serde_json::json;
    use serial_test::serial;
    use std::env;
    use tempfile::TempDir;

    /// Point `XDG_CONFIG_HOME` at an empty directory so a developer's own
    /// config does not leak into the assertions.
    struct IsolatedUserConfig {
        dir: TempDir,
        original: Option<std::ffi::OsString>,
    }

    impl IsolatedUserConfig {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let original = env::var_os("XDG_CONFIG_HOME");
            // SAFETY: tests using this are #[serial(xdg_env)]
            unsafe {
                env::set_var("XDG_CONFIG_HOME", dir.path());
            }
            Self { dir, original }
        }

        fn write_user_config(&self, contents: &str) {
            let config_dir = self.dir.path().join("line-status");
            fs::create_dir_all(&config_dir).unwrap();
            fs::write(config_dir.join(CONFIG_FILE_NAME), contents).unwrap();
        }
    }

    impl Drop for IsolatedUserConfig {
        fn drop(&mut self) {
            // SAFETY: tests using this are #[serial(xdg_env)]
            unsafe {
                match self.original.take() {
                    Some(val) => env::set_var("XDG_CONFIG_HOME", val),
                    None => env::remove_var("XDG_CONFIG_HOME"),
                }
            }
        }
    }

    #[test]
    #[serial(xdg_env)]
    fn test_no_layers_yields_defaults() {
        let _user = IsolatedUserConfig::new();

        let outcome = load_settings(None, None);

        assert_eq!(outcome.settings, TrackerSettings::default());
        assert!(outcome.events.is_empty());
    }

    #[test]
    #[serial(xdg_env)]
    fn test_layers_merge_in_precedence_order() {
        let user = IsolatedUserConfig::new();
        user.write_user_config(
            r#"
            algorithm = "patience"
            maxDiffLines = 100
            refineInnerRanges = true
            "#,
        );
        let project = TempDir::new().unwrap();
        fs::write(project.path().join(CONFIG_FILE_NAME), "maxDiffLines = 200\n").unwrap();

        let outcome = load_settings(Some(project.path()), Some(json!({ "diffTimeoutMs": 0 })));

        // user sets algorithm and refinement, project overrides the limit,
        // the override disables the deadline
        assert_eq!(outcome.settings.algorithm, DiffAlgorithm::Patience);
        assert!(outcome.settings.refine_inner_ranges);
        assert_eq!(outcome.settings.max_diff_lines, 200);
        assert_eq!(outcome.settings.diff_timeout, None);
        assert_eq!(outcome.events.len(), 3);
        assert!(
            outcome
                .events
                .iter()
                .all(|event| event.kind == SettingsEventKind::Info)
        );
    }

    #[test]
    #[serial(xdg_env)]
    fn test_malformed_project_config_is_skipped_with_warning() {
        let _user = IsolatedUserConfig::new();
        let project = TempDir::new().unwrap();
        fs::write(project.path().join(CONFIG_FILE_NAME), "maxDiffLines = [").unwrap();

        let outcome = load_settings(Some(project.path()), Some(json!({ "maxDiffLines": 7 })));

        assert_eq!(outcome.settings.max_diff_lines, 7);
        assert_eq!(outcome.events[0].kind, SettingsEventKind::Warning);
        assert!(outcome.events[0].message.contains("Failed to parse"));
    }

    #[test]
    #[serial(xdg_env)]
    fn test_invalid_override_is_reported() {
        let _user = IsolatedUserConfig::new();

        let outcome = load_settings(None, Some(json!({ "algorithm": 3 })));

        assert_eq!(outcome.settings, TrackerSettings::default());
        assert_eq!(outcome.events.len(), 1);
        assert_eq!(outcome.events[0].kind, SettingsEventKind::Warning);
        assert!(outcome.events[0].message.starts_with("Failed to parse settings override"));
    }
}
