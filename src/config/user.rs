//! User-wide configuration.
//!
//! Location: `$XDG_CONFIG_HOME/line-status/line-status.toml`, falling back to
//! the platform configuration directory.

use std::fs;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::TrackerConfig;

pub const CONFIG_FILE_NAME: &str = "line-status.toml";
const CONFIG_DIR_NAME: &str = "line-status";

#[derive(Debug, Error)]
pub enum UserConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type UserConfigResult<T> = Result<T, UserConfigError>;

/// Returns the path to the user configuration file.
///
/// `$XDG_CONFIG_HOME` wins when set, otherwise the platform config directory
/// from `dirs` is used. Returns None if neither can be determined.
pub fn user_config_path() -> Option<PathBuf> {
    let base = match std::env::var_os("XDG_CONFIG_HOME") {
        Some(xdg_config) if !xdg_config.is_empty() => PathBuf::from(xdg_config),
        _ => dirs::config_dir()?,
    };
    Some(base.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Load the user configuration file.
///
/// A missing file is not an error: `Ok(None)` is returned.
pub fn load_user_config() -> UserConfigResult<Option<TrackerConfig>> {
    let Some(path) = user_config_path() else {
        return Ok(None);
    };
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(&path).map_err(|source| UserConfigError::Read {
        path: path.clone(),
        source,
    })?;
    toml::from_str(&contents)
        .map(Some)
        .map_err(|source| UserConfigError::Parse { path, source })
}
