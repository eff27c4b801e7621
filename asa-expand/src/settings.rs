use std::fs;
use std::path::Path;

use asa_config_core::catalog::DEFAULT_MAX_DEPTH;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::builder::BuildOptions;

/// Tunables for a normalization run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Nesting limit for object-group references.
    pub max_depth: usize,
    /// Emit a `remark ORIGINAL:` line before every rewritten access-list.
    pub keep_original: bool,
    /// Emit NAT annotation comments.
    pub annotate_nat: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            keep_original: true,
            annotate_nat: true,
        }
    }
}

impl Settings {
    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            annotate_nat: self.annotate_nat,
            max_depth: self.max_depth,
        }
    }
}

/// Errors returned when loading settings files.
#[derive(Debug, Error)]
pub enum SettingsLoadError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid settings in {path}: {reason}")]
    Invalid { path: String, reason: String },
}

/// Load settings from a TOML file. Keys missing from the file keep their
/// built-in defaults.
pub fn load_settings(path: &Path) -> Result<Settings, SettingsLoadError> {
    let raw = fs::read_to_string(path).map_err(|source| SettingsLoadError::Io {
        path: path.display().to_string(),
        source,
    })?;

    parse_settings(&raw, path.display().to_string())
}

/// Settings shipped with the binary.
pub fn default_settings() -> Settings {
    let embedded = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/settings/default.toml"
    ));
    parse_settings(embedded, "embedded settings".to_string()).unwrap_or_default()
}

fn parse_settings(raw: &str, path: String) -> Result<Settings, SettingsLoadError> {
    let parsed: Settings = toml::from_str(raw).map_err(|source| SettingsLoadError::Parse {
        path: path.clone(),
        source,
    })?;
    if parsed.max_depth == 0 {
        return Err(SettingsLoadError::Invalid {
            path,
            reason: "max_depth must be at least 1".to_string(),
        });
    }
    Ok(parsed)
}
