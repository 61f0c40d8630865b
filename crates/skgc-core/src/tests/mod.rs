mod correlator;
mod state_store;

use crate::{Edition, LivenessOracle, ServerManager, ServerRecord};

use skgc_config::Config;

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;

/// Liveness oracle answering from a fixed set of live pids.
#[derive(Default)]
pub(crate) struct FakeLiveness {
    alive: Mutex<HashSet<u32>>,
}

impl FakeLiveness {
    pub(crate) fn with_alive(pids: &[u32]) -> Arc<Self> {
        Arc::new(Self {
            alive: Mutex::new(pids.iter().copied().collect()),
        })
    }

    pub(crate) fn kill(&self, pid: u32) {
        self.alive.lock().unwrap().remove(&pid);
    }
}

impl LivenessOracle for FakeLiveness {
    fn is_alive(&self, pid: u32) -> bool {
        self.alive.lock().unwrap().contains(&pid)
    }
}

/// Config with short relay timings so tests stay fast.
pub(crate) fn fast_config() -> Config {
    let mut config = Config::default();
    config.relay.poll_interval_ms = 20;
    config.relay.settle_delay_ms = 100;
    config
}

pub(crate) const TEST_POLL: Duration = Duration::from_millis(20);

/// Initialized installation in a temp dir, with a fake oracle.
pub(crate) fn setup_manager(
    edition: Edition,
    oracle: Arc<FakeLiveness>,
) -> (TempDir, ServerManager, ServerRecord) {
    let temp = TempDir::new().unwrap();
    let manager = ServerManager::with_oracle(temp.path(), fast_config(), oracle).unwrap();
    let record = manager.init(edition).unwrap();
    (temp, manager, record)
}

/// Mark the record running with `pid` without spawning anything.
pub(crate) fn force_running(temp: &TempDir, pid: u32) {
    let path = temp.path().join("skgc/skgc.json");
    let mut record: ServerRecord =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    record.mark_running(pid);
    std::fs::write(&path, serde_json::to_string_pretty(&record).unwrap()).unwrap();
}
