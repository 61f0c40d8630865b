//! On-disk layout of one installation.

use skgc_config::METADATA_DIR;

use std::path::{Path, PathBuf};

const RECORD_FILENAME: &str = "skgc.json";
const CONSOLE_LOG_FILENAME: &str = "stdout";
const COMMAND_BUFFER_FILENAME: &str = "stdin";
const BACKUP_DIR: &str = "backup";
const DOWNLOAD_DIR: &str = "download";
const PROPERTIES_FILENAME: &str = "server.properties";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallationPaths {
    root: PathBuf,
    metadata_dir: PathBuf,
}

impl InstallationPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let metadata_dir = root.join(METADATA_DIR);
        Self { root, metadata_dir }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/skgc/`
    pub fn metadata_dir(&self) -> &Path {
        &self.metadata_dir
    }

    pub fn record(&self) -> PathBuf {
        self.metadata_dir.join(RECORD_FILENAME)
    }

    pub fn console_log(&self) -> PathBuf {
        self.metadata_dir.join(CONSOLE_LOG_FILENAME)
    }

    pub fn command_buffer(&self) -> PathBuf {
        self.metadata_dir.join(COMMAND_BUFFER_FILENAME)
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.metadata_dir.join(BACKUP_DIR)
    }

    pub fn download_dir(&self) -> PathBuf {
        self.metadata_dir.join(DOWNLOAD_DIR)
    }

    pub fn properties(&self) -> PathBuf {
        self.root.join(PROPERTIES_FILENAME)
    }

    /// Directory name of the root, used as the default alias.
    pub fn display_name(&self) -> String {
        self.root
            .canonicalize()
            .ok()
            .as_deref()
            .unwrap_or(&self.root)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}
