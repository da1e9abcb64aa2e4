use std::ffi::OsString;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use tagloop::app_dirs::CONFIG_HOME_ENV;
use tempfile::TempDir;

static CONFIG_HOME_LOCK: Mutex<()> = Mutex::new(());

/// Private config home for one test. Holds the env lock until dropped.
pub struct TempConfigHome {
    dir: TempDir,
    previous: Option<OsString>,
    _lock: MutexGuard<'static, ()>,
}

impl TempConfigHome {
    pub fn new() -> Self {
        let lock = CONFIG_HOME_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let dir = tempfile::tempdir().expect("temp config home");
        let previous = std::env::var_os(CONFIG_HOME_ENV);
        // SAFETY: CONFIG_HOME_LOCK serializes every env change made by tests.
        unsafe { std::env::set_var(CONFIG_HOME_ENV, dir.path()) };
        Self {
            dir,
            previous,
            _lock: lock,
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

impl Drop for TempConfigHome {
    fn drop(&mut self) {
        // SAFETY: the lock is still held; it is released after this body.
        unsafe {
            match self.previous.take() {
                Some(value) => std::env::set_var(CONFIG_HOME_ENV, value),
                None => std::env::remove_var(CONFIG_HOME_ENV),
            }
        }
    }
}
