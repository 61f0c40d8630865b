use crate::{Edition, LivenessOracle};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Persisted identity, configuration and live status of one installation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerRecord {
    /// Minted once by `init`, never changed afterwards
    pub init_id: String,
    pub edition: Edition,
    pub alias: String,
    pub start_command: String,
    pub stop_command: String,
    /// True while the supervisor believes the process is running
    pub status: bool,
    #[serde(default)]
    pub pid: Option<u32>,
    /// Caller-defined data, passed through untouched
    #[serde(default)]
    pub misc: Map<String, Value>,
}

impl ServerRecord {
    /// Fresh record with edition defaults and a new init id.
    pub fn new(edition: Edition, alias: impl Into<String>) -> Self {
        Self {
            init_id: Uuid::new_v4().to_string(),
            edition,
            alias: alias.into(),
            start_command: edition.default_start_command().to_string(),
            stop_command: edition.default_stop_command().to_string(),
            status: false,
            pid: None,
            misc: Map::new(),
        }
    }

    pub fn mark_running(&mut self, pid: u32) {
        self.status = true;
        self.pid = Some(pid);
    }

    pub fn mark_stopped(&mut self) {
        self.status = false;
        self.pid = None;
    }

    /// Correct `status`/`pid` against the process table.
    ///
    /// Returns true when the record was changed and needs persisting.
    pub fn reconcile(&mut self, oracle: &dyn LivenessOracle) -> bool {
        let alive = match (self.status, self.pid) {
            (true, Some(pid)) => oracle.is_alive(pid),
            (true, None) => false,
            (false, None) => return false,
            (false, Some(_)) => false,
        };

        if alive {
            return false;
        }

        self.mark_stopped();
        true
    }
}
