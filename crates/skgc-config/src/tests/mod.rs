mod config;

use std::env;

use tempfile::TempDir;

/// RAII guard for environment variables - automatically restores on drop
pub(crate) struct EnvGuard {
    key: &'static str,
    original: Option<String>,
}

impl EnvGuard {
    pub(crate) fn set(key: &'static str, value: &str) -> Self {
        unsafe {
            let original = env::var(key).ok();
            env::set_var(key, value);
            Self { key, original }
        }
    }

    pub(crate) fn remove(key: &'static str) -> Self {
        unsafe {
            let original = env::var(key).ok();
            env::remove_var(key);
            Self { key, original }
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        unsafe {
            match &self.original {
                Some(val) => env::set_var(self.key, val),
                None => env::remove_var(self.key),
            }
        }
    }
}

/// Create a temp installation root with an empty `skgc/` directory
pub(crate) fn setup_installation() -> (TempDir, EnvGuard) {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir_all(temp.path().join(crate::METADATA_DIR)).unwrap();
    let guard = EnvGuard::remove(crate::CONFIG_DIR_ENV);
    (temp, guard)
}
