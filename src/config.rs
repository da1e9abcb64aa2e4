use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app_dirs;
use crate::selection::{SamplePool, SelectionMode};

/// File name of the settings file inside the `.tagloop` directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";
/// Labels between two automatic classifier refreshes.
pub const DEFAULT_RETRAIN_FREQUENCY: usize = 10;

/// Settings persisted in `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub display: DisplaySettings,
}

/// Annotation loop preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// History growth between two automatic classifier refreshes.
    #[serde(default = "default_retrain_frequency")]
    pub retrain_frequency: usize,
    #[serde(default)]
    pub default_mode: SelectionMode,
    #[serde(default)]
    pub default_sample: SamplePool,
    /// Bind digit keys to labels when the scheme has at most nine of them.
    #[serde(default = "default_true")]
    pub keyboard_shortcuts: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            retrain_frequency: DEFAULT_RETRAIN_FREQUENCY,
            default_mode: SelectionMode::default(),
            default_sample: SamplePool::default(),
            keyboard_shortcuts: true,
        }
    }
}

/// What accompanies the element text on screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplaySettings {
    #[serde(default = "default_true")]
    pub show_prediction: bool,
    #[serde(default)]
    pub show_context: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_prediction: true,
            show_context: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_retrain_frequency() -> usize {
    DEFAULT_RETRAIN_FREQUENCY
}

/// Failures reading or writing `config.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot create settings directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Cannot read settings {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Cannot write settings {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed settings in {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Cannot encode settings for {path}: {source}")]
    SerializeToml {
        path: PathBuf,
        source: toml::ser::Error,
    },
    #[error("No settings directory available")]
    NoConfigDir,
}

/// Location of `config.toml`; the `.tagloop` directory is created on demand.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let dir = app_dirs::app_root_dir().map_err(map_app_dir_error)?;
    Ok(dir.join(CONFIG_FILE_NAME))
}

/// Read the settings file, or defaults when none was saved yet.
pub fn load_or_default() -> Result<AppConfig, ConfigError> {
    let path = config_path()?;
    if !path.exists() {
        tracing::debug!("No config at {}; using defaults", path.display());
        return Ok(AppConfig::default());
    }
    load_from(&path)
}

/// Load configuration from a specific TOML file.
pub fn load_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&data).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })
}

/// Write the settings file under the `.tagloop` directory.
pub fn save(config: &AppConfig) -> Result<(), ConfigError> {
    let path = config_path()?;
    save_to_path(config, &path)
}

/// Write settings to `path`, creating missing parent directories.
pub fn save_to_path(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let data = toml::to_string_pretty(config).map_err(|source| ConfigError::SerializeToml {
        path: path.to_path_buf(),
        source,
    })?;
    atomic_write(path, data.as_bytes())
}

/// Write through a sibling temp file so a crash never leaves half a config.
fn atomic_write(path: &Path, data: &[u8]) -> Result<(), ConfigError> {
    let map_write = |source: std::io::Error| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| map_write(std::io::Error::other("config path has no file name")))?;
    let tmp_path = path.with_file_name(format!(
        "{}.tmp-{}",
        file_name.to_string_lossy(),
        uuid::Uuid::new_v4().simple()
    ));
    std::fs::write(&tmp_path, data).map_err(map_write)?;
    if let Err(err) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(map_write(err));
    }
    Ok(())
}

fn map_app_dir_error(err: app_dirs::AppDirError) -> ConfigError {
    match err {
        app_dirs::AppDirError::NoBaseDir => ConfigError::NoConfigDir,
        app_dirs::AppDirError::CreateDir { path, source } => {
            ConfigError::CreateDir { path, source }
        }
    }
}
