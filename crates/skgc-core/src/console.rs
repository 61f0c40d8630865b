//! File-backed console relay.
//!
//! The Console Log (`skgc/stdout`) and Command Buffer (`skgc/stdin`) are the
//! only channel between the invocation that owns the server process and any
//! other invocation that wants to read output or send commands. Both are
//! accessed with whole-file reads, appends and overwrites.

use crate::{Result, SupervisorError};

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, warn};
use tokio::fs::OpenOptions;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

/// Append-only transcript of process output and echoed commands.
#[derive(Debug, Clone)]
pub struct ConsoleLog {
    path: PathBuf,
}

impl ConsoleLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn truncate(&self) -> Result<()> {
        tokio::fs::write(&self.path, b"")
            .await
            .map_err(|e| SupervisorError::io(&self.path, e))
    }

    /// Append one line and flush it so other readers see it immediately.
    pub async fn append_line(&self, line: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| SupervisorError::io(&self.path, e))?;

        let mut bytes = Vec::with_capacity(line.len() + 1);
        bytes.extend_from_slice(line.as_bytes());
        bytes.push(b'\n');

        file.write_all(&bytes)
            .await
            .map_err(|e| SupervisorError::io(&self.path, e))?;
        file.flush()
            .await
            .map_err(|e| SupervisorError::io(&self.path, e))
    }

    /// Snapshot of all complete lines. A trailing line still being written
    /// (no newline yet) is left out.
    pub async fn read_lines(&self) -> Result<Vec<String>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(SupervisorError::io(&self.path, e)),
        };

        let text = String::from_utf8_lossy(&bytes);
        let complete = match text.rfind('\n') {
            Some(end) => &text[..end],
            None => return Ok(Vec::new()),
        };

        Ok(complete
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
            .collect())
    }

    /// The last `count` complete lines.
    pub async fn tail(&self, count: usize) -> Result<Vec<String>> {
        let mut lines = self.read_lines().await?;
        let start = lines.len().saturating_sub(count);
        Ok(lines.split_off(start))
    }
}

/// Single-slot mailbox carrying the next line for the process's stdin.
#[derive(Debug, Clone)]
pub struct CommandBuffer {
    path: PathBuf,
}

impl CommandBuffer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn truncate(&self) -> Result<()> {
        tokio::fs::write(&self.path, b"")
            .await
            .map_err(|e| SupervisorError::io(&self.path, e))
    }

    /// Append a command line for the forward loop to pick up.
    pub async fn push(&self, line: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| SupervisorError::io(&self.path, e))?;

        file.write_all(format!("{line}\n").as_bytes())
            .await
            .map_err(|e| SupervisorError::io(&self.path, e))?;
        file.flush()
            .await
            .map_err(|e| SupervisorError::io(&self.path, e))
    }

    /// Pending content without consuming it.
    pub async fn peek(&self) -> Result<String> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(SupervisorError::io(&self.path, e)),
        }
    }

    /// First pending line, if any. The whole buffer is cleared: lines queued
    /// behind the first one within the same tick are dropped.
    pub async fn take_first(&self) -> Result<Option<String>> {
        let content = self.peek().await?;
        if content.is_empty() {
            return Ok(None);
        }

        let first = content.lines().next().unwrap_or_default();
        let first = first.strip_suffix('\r').unwrap_or(first).to_string();

        self.truncate().await?;
        Ok(Some(first))
    }
}

/// Capture and forward loops for one server session.
#[derive(Debug, Clone)]
pub struct ConsoleRelay {
    log: ConsoleLog,
    buffer: CommandBuffer,
    poll_interval: Duration,
}

/// Join handles of a running relay.
pub struct RelayHandle {
    capture: JoinHandle<()>,
    forward: JoinHandle<()>,
}

impl RelayHandle {
    /// Wait until both loops have drained.
    pub async fn join(self) {
        if let Err(e) = self.capture.await {
            warn!("Console capture task failed: {e}");
        }
        if let Err(e) = self.forward.await {
            warn!("Command forward task failed: {e}");
        }
    }
}

impl ConsoleRelay {
    pub fn new(log: ConsoleLog, buffer: CommandBuffer, poll_interval: Duration) -> Self {
        Self {
            log,
            buffer,
            poll_interval,
        }
    }

    /// Start both loops. They stop once `exited` flips to true.
    pub fn spawn<R, W>(self, stdout: R, stdin: W, exited: watch::Receiver<bool>) -> RelayHandle
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let capture = tokio::spawn(Self::capture(self.log.clone(), stdout, exited.clone()));
        let forward = tokio::spawn(Self::forward(
            self.buffer,
            self.log,
            stdin,
            self.poll_interval,
            exited,
        ));

        RelayHandle { capture, forward }
    }

    /// Copy process output into the Console Log line by line.
    ///
    /// End-of-stream alone does not end the loop; it also waits for the
    /// process to be observed as exited.
    pub async fn capture<R>(log: ConsoleLog, stdout: R, mut exited: watch::Receiver<bool>)
    where
        R: AsyncRead + Unpin,
    {
        let mut reader = BufReader::new(stdout);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let text = String::from_utf8_lossy(&buf);
                    let line = text.trim_end_matches(['\n', '\r']);
                    if let Err(e) = log.append_line(line).await {
                        warn!("Failed to append to console log: {e}");
                    }
                }
                Err(e) => {
                    warn!("Reading server output failed: {e}");
                    break;
                }
            }
        }

        // Sender dropped also means the session is over.
        let _ = exited.wait_for(|done| *done).await;
        debug!("Console capture finished");
    }

    /// Every tick, move the first pending command from the buffer to the
    /// process and echo it into the Console Log.
    pub async fn forward<W>(
        buffer: CommandBuffer,
        log: ConsoleLog,
        mut stdin: W,
        poll_interval: Duration,
        exited: watch::Receiver<bool>,
    ) where
        W: AsyncWrite + Unpin,
    {
        let mut ticker = interval_at(Instant::now() + poll_interval, poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            if *exited.borrow() || exited.has_changed().is_err() {
                break;
            }

            let line = match buffer.take_first().await {
                Ok(Some(line)) => line,
                Ok(None) => continue,
                Err(e) => {
                    warn!("Failed to read command buffer: {e}");
                    continue;
                }
            };

            let sent = async {
                stdin.write_all(format!("{line}\n").as_bytes()).await?;
                stdin.flush().await
            }
            .await;

            if let Err(e) = sent {
                warn!("Failed to forward '{line}' to server input: {e}");
                continue;
            }

            debug!("Forwarded command: {line}");
            if let Err(e) = log.append_line(&line).await {
                warn!("Failed to echo command into console log: {e}");
            }
        }

        debug!("Command forwarding finished");
    }
}
