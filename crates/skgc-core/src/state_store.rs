//! Durable JSON record with self-healing reads.
//!
//! Every `load()` runs the liveness reconciliation step: a record that claims
//! a running process whose PID is gone is corrected and written back before it
//! is returned. This is how a fresh supervisor invocation recovers the truth
//! after the previous one died.
//!
//! `save()` writes a sibling temp file and renames it over the record, so
//! readers in other invocations never observe a half-written document.

use crate::{LivenessOracle, OsLiveness, Result, ServerRecord, SupervisorError};

use std::fs::File;
use std::io::Write;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use error_location::ErrorLocation;
use log::{debug, warn};

const TEMP_SUFFIX: &str = "tmp";

pub struct StateStore {
    path: PathBuf,
    oracle: Arc<dyn LivenessOracle>,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_oracle(path, Arc::new(OsLiveness))
    }

    pub fn with_oracle(path: impl Into<PathBuf>, oracle: Arc<dyn LivenessOracle>) -> Self {
        Self {
            path: path.into(),
            oracle,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Read the record exactly as stored, without reconciliation.
    #[track_caller]
    pub fn load_raw(&self) -> Result<ServerRecord> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SupervisorError::NotInitialized {
                    path: self.path.clone(),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            Err(e) => return Err(SupervisorError::io(&self.path, e)),
        };

        serde_json::from_str(&content).map_err(|e| SupervisorError::Json {
            path: self.path.clone(),
            source: e,
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Read, reconcile against process liveness, persist any correction.
    #[track_caller]
    pub fn load(&self) -> Result<ServerRecord> {
        let mut record = self.load_raw()?;

        let stale_pid = record.pid;
        if record.reconcile(self.oracle.as_ref()) {
            warn!(
                "Recorded server process {:?} is gone, marking installation stopped",
                stale_pid
            );
            self.save(&record)?;
        }

        Ok(record)
    }

    /// Atomically replace the stored record.
    #[track_caller]
    pub fn save(&self, record: &ServerRecord) -> Result<()> {
        let content = serde_json::to_string_pretty(record).map_err(|e| SupervisorError::Json {
            path: self.path.clone(),
            source: e,
            location: ErrorLocation::from(Location::caller()),
        })?;

        let temp_path = self.temp_path();
        let written = Self::write_synced(&temp_path, content.as_bytes())
            .and_then(|()| std::fs::rename(&temp_path, &self.path));

        if let Err(e) = written {
            std::fs::remove_file(&temp_path).ok();
            return Err(SupervisorError::io(&self.path, e));
        }

        debug!("Saved server record to {}", self.path.display());
        Ok(())
    }

    /// load → mutate → save, returning the saved record.
    #[track_caller]
    pub fn update<F>(&self, mutate: F) -> Result<ServerRecord>
    where
        F: FnOnce(&mut ServerRecord),
    {
        let mut record = self.load()?;
        mutate(&mut record);
        self.save(&record)?;
        Ok(record)
    }

    fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(bytes)?;
        file.sync_all()
    }

    /// Unique temp file next to the record so the rename stays on one filesystem.
    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        self.path.with_file_name(format!(
            ".{file_name}.{}.{TEMP_SUFFIX}",
            uuid::Uuid::new_v4().simple()
        ))
    }
}
