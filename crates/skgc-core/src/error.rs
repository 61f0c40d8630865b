use std::panic::Location;
use std::path::{Path, PathBuf};

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("Installation directory does not exist: {path} {location}")]
    InstallationNotFound {
        path: PathBuf,
        location: ErrorLocation,
    },

    #[error("Installation is not initialized (no record at {path}) {location}")]
    NotInitialized {
        path: PathBuf,
        location: ErrorLocation,
    },

    #[error("Installation is already initialized (record at {path}) {location}")]
    AlreadyInitialized {
        path: PathBuf,
        location: ErrorLocation,
    },

    #[error("Server is already running (pid {pid:?}) {location}")]
    AlreadyRunning {
        pid: Option<u32>,
        location: ErrorLocation,
    },

    #[error("Server is not running {location}")]
    NotRunning { location: ErrorLocation },

    #[error("Server process exited abnormally (exit code {code:?}) {location}")]
    ProcessError {
        code: Option<i32>,
        location: ErrorLocation,
    },

    #[error("Failed to spawn `{command}`: {source} {location}")]
    ProcessSpawn {
        command: String,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Failed to wait for server process: {source} {location}")]
    ProcessWait {
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Unknown edition '{value}' (expected java or bedrock) {location}")]
    InvalidEdition {
        value: String,
        location: ErrorLocation,
    },

    #[error("Invalid argument: {message} {location}")]
    InvalidArgument {
        message: String,
        location: ErrorLocation,
    },

    #[error("Property '{key}' missing from {path} {location}")]
    MissingProperty {
        key: String,
        path: PathBuf,
        location: ErrorLocation,
    },

    #[error("Malformed properties file {path} at line {line}: {message} {location}")]
    Properties {
        path: PathBuf,
        line: usize,
        message: String,
        location: ErrorLocation,
    },

    #[error("Invalid JSON in {path}: {source} {location}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
        location: ErrorLocation,
    },

    #[error("IO error at {path}: {source} {location}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("HTTP error downloading {url}: {source} {location}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
        location: ErrorLocation,
    },

    #[error("Download of {url} returned HTTP {status} {location}")]
    DownloadStatus {
        url: String,
        status: u16,
        location: ErrorLocation,
    },

    #[error("Failed to unpack archive {path}: {source} {location}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
        location: ErrorLocation,
    },
}

impl SupervisorError {
    #[track_caller]
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        Self::InvalidArgument {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn not_running() -> Self {
        Self::NotRunning {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Short message for end users, without source locations.
    pub fn user_message(&self) -> String {
        match self {
            Self::InstallationNotFound { path, .. } => {
                format!("{} is not a directory", path.display())
            }
            Self::NotInitialized { .. } => String::from("Server is not initialized"),
            Self::AlreadyInitialized { .. } => String::from("Server is already initialized"),
            Self::AlreadyRunning { .. } => String::from("Server is already running"),
            Self::NotRunning { .. } => String::from("Server is not running"),
            Self::ProcessError { code: Some(code), .. } => {
                format!("Server process exited with code {code}")
            }
            Self::ProcessError { code: None, .. } => {
                String::from("Server process was terminated by a signal")
            }
            Self::ProcessSpawn {
                command, source, ..
            } => format!("Could not run `{command}`: {source}"),
            Self::ProcessWait { source, .. } => format!("Lost track of server process: {source}"),
            Self::InvalidEdition { value, .. } => {
                format!("Unknown edition '{value}' (expected java or bedrock)")
            }
            Self::InvalidArgument { message, .. } => message.clone(),
            Self::MissingProperty { key, path, .. } => {
                format!("'{key}' is not set in {}", path.display())
            }
            Self::Properties {
                path,
                line,
                message,
                ..
            } => format!("{}:{line}: {message}", path.display()),
            Self::Json { path, source, .. } => format!("{} is corrupt: {source}", path.display()),
            Self::Io { path, source, .. } => format!("{}: {source}", path.display()),
            Self::Http { url, source, .. } => format!("Download of {url} failed: {source}"),
            Self::DownloadStatus { url, status, .. } => {
                format!("Download of {url} failed with HTTP {status}")
            }
            Self::Archive { path, source, .. } => {
                format!("Could not unpack {}: {source}", path.display())
            }
        }
    }

    pub fn recovery_hint(&self) -> Option<&'static str> {
        match self {
            Self::NotInitialized { .. } => Some("Run `skgc init <java|bedrock>` first."),
            Self::AlreadyInitialized { .. } => {
                Some("Delete the skgc directory to re-initialize this installation.")
            }
            Self::AlreadyRunning { .. } => Some("Stop the server with `skgc stop` first."),
            Self::NotRunning { .. } => Some("Start the server with `skgc start`."),
            Self::ProcessError { .. } | Self::ProcessSpawn { .. } => {
                Some("Check the start command and the console log in skgc/stdout.")
            }
            Self::MissingProperty { .. } => {
                Some("Start the server once so it writes server.properties, or set the port.")
            }
            Self::Json { .. } => Some("Restore skgc/skgc.json from a backup or re-initialize."),
            Self::Http { .. } | Self::DownloadStatus { .. } | Self::Archive { .. } => {
                Some("Previous server files are kept in skgc/backup.")
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SupervisorError>;
