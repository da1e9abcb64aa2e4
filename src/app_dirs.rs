//! Application directory helpers anchored to a single `.tagloop` folder.
//!
//! Config and log files live under the OS config directory unless
//! `TAGLOOP_CONFIG_HOME` points elsewhere (tests, portable setups).

use std::path::PathBuf;

use directories::BaseDirs;
use thiserror::Error;

/// Directory holding settings and session logs.
pub const APP_DIR_NAME: &str = ".tagloop";
/// Environment variable overriding the config root.
pub const CONFIG_HOME_ENV: &str = "TAGLOOP_CONFIG_HOME";

/// Failures locating or creating the `.tagloop` directory.
#[derive(Debug, Error)]
pub enum AppDirError {
    #[error("Cannot locate a home directory for .tagloop")]
    NoBaseDir,
    #[error("Cannot create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Return the root `.tagloop` directory, creating it if needed.
pub fn app_root_dir() -> Result<PathBuf, AppDirError> {
    let base = config_base_dir().ok_or(AppDirError::NoBaseDir)?;
    ensure_dir(base.join(APP_DIR_NAME))
}

/// Return the logs directory inside the `.tagloop` root, creating it if needed.
pub fn logs_dir() -> Result<PathBuf, AppDirError> {
    ensure_dir(app_root_dir()?.join("logs"))
}

fn ensure_dir(path: PathBuf) -> Result<PathBuf, AppDirError> {
    std::fs::create_dir_all(&path).map_err(|source| AppDirError::CreateDir {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

fn config_base_dir() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_HOME_ENV)
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }
    BaseDirs::new().map(|dirs| dirs.config_dir().to_path_buf())
}
