//! Server lifecycle for one installation.
//!
//! A `ServerManager` is cheap to construct: every invocation of the CLI builds
//! a fresh one and recovers the current state from the record on disk. Only
//! the invocation that ran `start()` holds the child process; everything else
//! talks to it through the Console Log and Command Buffer.

use crate::{
    CommandBuffer, ConsoleLog, ConsoleRelay, Downloader, Edition, InstallationPaths,
    LivenessOracle, OsLiveness, PropertiesFile, Result, ServerRecord, StateStore,
    SupervisorError, update_bedrock_server, update_java_server,
};

use skgc_config::Config;

use std::panic::Location;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;

use error_location::ErrorLocation;
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::process::Command;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

/// Snapshot used by `skgc status`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub record: ServerRecord,
    /// None when `server.properties` is absent or incomplete
    pub ports: Option<Vec<(&'static str, u16)>>,
}

pub struct ServerManager {
    paths: InstallationPaths,
    store: StateStore,
    console_log: ConsoleLog,
    command_buffer: CommandBuffer,
    config: Config,
}

impl ServerManager {
    #[track_caller]
    pub fn open(root: impl AsRef<Path>, config: Config) -> Result<Self> {
        Self::with_oracle(root, config, Arc::new(OsLiveness))
    }

    #[track_caller]
    pub fn with_oracle(
        root: impl AsRef<Path>,
        config: Config,
        oracle: Arc<dyn LivenessOracle>,
    ) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(SupervisorError::InstallationNotFound {
                path: root.to_path_buf(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let paths = InstallationPaths::new(root);
        Ok(Self {
            store: StateStore::with_oracle(paths.record(), oracle),
            console_log: ConsoleLog::new(paths.console_log()),
            command_buffer: CommandBuffer::new(paths.command_buffer()),
            paths,
            config,
        })
    }

    pub fn paths(&self) -> &InstallationPaths {
        &self.paths
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn console_log(&self) -> &ConsoleLog {
        &self.console_log
    }

    pub fn command_buffer(&self) -> &CommandBuffer {
        &self.command_buffer
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Create the metadata directory and a fresh record.
    #[track_caller]
    pub fn init(&self, edition: Edition) -> Result<ServerRecord> {
        if self.store.exists() {
            return Err(SupervisorError::AlreadyInitialized {
                path: self.store.path().to_path_buf(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let metadata_dir = self.paths.metadata_dir();
        std::fs::create_dir_all(metadata_dir)
            .map_err(|e| SupervisorError::io(metadata_dir, e))?;

        for path in [self.console_log.path(), self.command_buffer.path()] {
            std::fs::write(path, b"").map_err(|e| SupervisorError::io(path, e))?;
        }

        let record = ServerRecord::new(edition, self.paths.display_name());
        self.store.save(&record)?;

        info!(
            "Initialized {} installation '{}' ({})",
            record.edition, record.alias, record.init_id
        );
        Ok(record)
    }

    /// Run the server until it exits.
    ///
    /// Returns `ProcessError` when the process exits non-zero or by signal.
    pub async fn start(&self) -> Result<()> {
        let record = self.store.load()?;
        if record.status {
            return Err(SupervisorError::AlreadyRunning {
                pid: record.pid,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        self.command_buffer.truncate().await?;
        self.console_log.truncate().await?;

        let command_line = record.start_command.clone();
        info!("Starting '{}': {command_line}", record.alias);

        let mut child = shell_command(&command_line)
            .current_dir(self.paths.root())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| SupervisorError::ProcessSpawn {
                command: command_line.clone(),
                source: e,
                location: ErrorLocation::from(Location::caller()),
            })?;

        let (Some(pid), Some(stdout), Some(stdin)) =
            (child.id(), child.stdout.take(), child.stdin.take())
        else {
            // Only possible if the child was already reaped.
            child.start_kill().ok();
            return Err(SupervisorError::ProcessWait {
                source: std::io::Error::other("server process has no pid or stdio"),
                location: ErrorLocation::from(Location::caller()),
            });
        };

        let mut running = record;
        running.mark_running(pid);
        if let Err(e) = self.store.save(&running) {
            warn!("Could not record server pid {pid}, killing it: {e}");
            child.start_kill().ok();
            child.wait().await.ok();
            return Err(e);
        }
        info!("Server '{}' running with pid {pid}", running.alias);

        let (exited_tx, exited_rx) = watch::channel(false);
        let relay = ConsoleRelay::new(
            self.console_log.clone(),
            self.command_buffer.clone(),
            self.config.relay.poll_interval(),
        )
        .spawn(stdout, stdin, exited_rx);

        let waited = child.wait().await;
        exited_tx.send_replace(true);
        relay.join().await;

        let mut stopped = self.store.load_raw()?;
        stopped.mark_stopped();
        self.store.save(&stopped)?;

        let status = waited.map_err(|e| SupervisorError::ProcessWait {
            source: e,
            location: ErrorLocation::from(Location::caller()),
        })?;

        if status.success() {
            info!("Server '{}' stopped", stopped.alias);
            Ok(())
        } else {
            warn!("Server '{}' exited abnormally: {status}", stopped.alias);
            Err(SupervisorError::ProcessError {
                code: status.code(),
                location: ErrorLocation::from(Location::caller()),
            })
        }
    }

    /// Ask the running server to shut down. Does not wait for the exit.
    pub async fn stop(&self) -> Result<()> {
        let record = self.store.load()?;
        if !record.status {
            return Err(SupervisorError::not_running());
        }

        info!("Sending stop command to '{}'", record.alias);
        self.command_buffer.push(record.stop_command.trim_end()).await
    }

    /// Queue a console command for the running server.
    pub async fn input_command(&self, text: &str) -> Result<()> {
        let text = text.trim_end();
        if !self.store.load()?.status {
            return Err(SupervisorError::not_running());
        }

        debug!("Queueing console command: {text}");
        self.command_buffer.push(text).await
    }

    /// Last `tail` lines of the running session's console.
    pub async fn read_log(&self, tail: usize) -> Result<Vec<String>> {
        if !self.store.load()?.status {
            return Err(SupervisorError::not_running());
        }

        self.console_log.tail(tail).await
    }

    /// Replay the last `tail` lines, then stream new lines until the server
    /// is seen stopped.
    pub async fn follow_log<F>(&self, tail: usize, mut on_line: F) -> Result<()>
    where
        F: FnMut(&str),
    {
        if !self.store.load()?.status {
            return Err(SupervisorError::not_running());
        }

        let lines = self.console_log.read_lines().await?;
        let start = lines.len().saturating_sub(tail);
        for line in &lines[start..] {
            on_line(line.as_str());
        }
        let mut cursor = lines.len();

        let period = self.config.relay.poll_interval();
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            // Status first so lines written before the exit are still shown.
            let running = self.store.load()?.status;
            let lines = self.console_log.read_lines().await?;

            if lines.len() < cursor {
                debug!("Console log shrank, restarting from the top");
                cursor = 0;
            }
            for line in &lines[cursor..] {
                on_line(line.as_str());
            }
            cursor = lines.len();

            if !running {
                return Ok(());
            }
        }
    }

    /// Replace the server files with the artifact at `url`.
    pub async fn update(&self, url: &str, downloader: &dyn Downloader) -> Result<()> {
        let record = self.store.load()?;
        if record.status {
            return Err(SupervisorError::AlreadyRunning {
                pid: record.pid,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        info!("Updating {} server '{}' from {url}", record.edition, record.alias);
        match record.edition {
            Edition::Java => update_java_server(&self.paths, downloader, url).await?,
            Edition::Bedrock => update_bedrock_server(&self.paths, downloader, url).await?,
        }
        info!("Update of '{}' complete", record.alias);
        Ok(())
    }

    // =========================================================================
    // Record accessors
    // =========================================================================

    /// Reconciled record.
    pub fn record(&self) -> Result<ServerRecord> {
        self.store.load()
    }

    pub fn status(&self) -> Result<bool> {
        Ok(self.store.load()?.status)
    }

    pub fn init_id(&self) -> Result<String> {
        Ok(self.store.load()?.init_id)
    }

    pub fn alias(&self) -> Result<String> {
        Ok(self.store.load()?.alias)
    }

    pub fn set_alias(&self, alias: impl Into<String>) -> Result<()> {
        let alias = alias.into();
        self.store.update(|record| record.alias = alias).map(drop)
    }

    pub fn edition(&self) -> Result<Edition> {
        Ok(self.store.load()?.edition)
    }

    pub fn set_edition(&self, edition: Edition) -> Result<()> {
        self.store.update(|record| record.edition = edition).map(drop)
    }

    pub fn start_command(&self) -> Result<String> {
        Ok(self.store.load()?.start_command)
    }

    pub fn set_start_command(&self, command: impl Into<String>) -> Result<()> {
        let command = command.into();
        self.store
            .update(|record| record.start_command = command)
            .map(drop)
    }

    pub fn stop_command(&self) -> Result<String> {
        Ok(self.store.load()?.stop_command)
    }

    pub fn set_stop_command(&self, command: impl Into<String>) -> Result<()> {
        let command = command.into();
        self.store
            .update(|record| record.stop_command = command)
            .map(drop)
    }

    pub fn misc(&self) -> Result<Map<String, Value>> {
        Ok(self.store.load()?.misc)
    }

    pub fn set_misc(&self, misc: Map<String, Value>) -> Result<()> {
        self.store.update(|record| record.misc = misc).map(drop)
    }

    // =========================================================================
    // server.properties
    // =========================================================================

    /// Current values of the edition's port keys.
    pub fn ports(&self) -> Result<Vec<(&'static str, u16)>> {
        let edition = self.store.load()?.edition;
        let path = self.paths.properties();
        let properties = PropertiesFile::load(&path)?;

        edition
            .port_keys()
            .iter()
            .map(|&key| {
                let Some(raw) = properties.get(key) else {
                    return Err(SupervisorError::MissingProperty {
                        key: key.to_string(),
                        path: path.clone(),
                        location: ErrorLocation::from(Location::caller()),
                    });
                };

                raw.parse::<u16>().map(|port| (key, port)).map_err(|_| {
                    SupervisorError::invalid_argument(format!(
                        "{key} in {} is not a port number: '{raw}'",
                        path.display()
                    ))
                })
            })
            .collect()
    }

    /// Write the edition's port keys derived from `base`.
    pub fn set_port(&self, base: u16) -> Result<Vec<(&'static str, u16)>> {
        let edition = self.store.load()?.edition;
        let assignments = edition.port_assignments(base).ok_or_else(|| {
            SupervisorError::invalid_argument(format!(
                "port {base} is too high for a {edition} server"
            ))
        })?;

        let path = self.paths.properties();
        let mut properties = PropertiesFile::load_or_default(&path)?;
        for (key, port) in &assignments {
            properties.set(key, port.to_string());
        }
        properties.save(&path)?;

        info!("Set {edition} ports from base {base}");
        Ok(assignments)
    }

    pub fn status_report(&self) -> Result<StatusReport> {
        let record = self.store.load()?;
        let ports = match self.ports() {
            Ok(ports) => Some(ports),
            Err(e) => {
                debug!("Ports unavailable: {e}");
                None
            }
        };

        Ok(StatusReport { record, ports })
    }
}

#[cfg(windows)]
fn shell_command(command_line: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command_line);
    cmd
}

#[cfg(not(windows))]
fn shell_command(command_line: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command_line);
    cmd
}
