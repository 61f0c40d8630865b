//! Interactive console attach: stream the Console Log to stdout and feed
//! typed lines into the Command Buffer.

use skgc_core::{Result, ServerManager, SupervisorError};

use std::io::BufRead;

use log::debug;
use tokio::sync::mpsc;

/// Attach until the server is seen stopped.
///
/// Stdin is read on a plain thread; a blocked terminal read would otherwise
/// keep the runtime from shutting down.
pub(crate) async fn attach(manager: &ServerManager) -> Result<()> {
    let tail = manager.config().relay.log_tail_lines;
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    let forward = async {
        while let Some(line) = rx.recv().await {
            if line.trim().is_empty() {
                continue;
            }
            match manager.input_command(&line).await {
                Ok(()) => {}
                Err(SupervisorError::NotRunning { .. }) => return Ok(()),
                Err(e) => return Err(e),
            }
        }

        debug!("Console input closed, output only");
        std::future::pending::<Result<()>>().await
    };

    let follow = manager.follow_log(tail, |line| println!("{line}"));

    tokio::select! {
        result = follow => result,
        result = forward => result,
    }
}
