//! Request/response over the console.
//!
//! The server's console has no request ids, so a response is located by
//! finding the echo of the command in the Console Log and scanning the lines
//! written after it.

use crate::{Result, ServerManager, SupervisorError};

use std::time::Duration;

use log::debug;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

pub struct CommandCorrelator<'a> {
    manager: &'a ServerManager,
    settle_delay: Duration,
}

impl<'a> CommandCorrelator<'a> {
    /// Correlator using the manager's configured settle delay.
    pub fn new(manager: &'a ServerManager) -> Self {
        let settle_delay = manager.config().relay.settle_delay();
        Self::with_settle_delay(manager, settle_delay)
    }

    pub fn with_settle_delay(manager: &'a ServerManager, settle_delay: Duration) -> Self {
        Self {
            manager,
            settle_delay,
        }
    }

    /// Send `command`, wait, and return the newest matching line after its echo.
    pub async fn send_and_await<P>(&self, command: &str, predicate: P) -> Result<Option<String>>
    where
        P: Fn(&str) -> bool,
    {
        self.manager.input_command(command).await?;
        tokio::time::sleep(self.settle_delay).await;

        let lines = self.manager.console_log().read_lines().await?;
        let response = find_response(&lines, command, predicate).map(str::to_string);

        debug!("Response to '{command}': {response:?}");
        Ok(response)
    }

    /// Current position of an online player.
    pub async fn query_coordinate(&self, player: &str) -> Result<Option<Coordinate>> {
        validate_player(player)?;

        let marker = teleport_marker(player);
        let line = self
            .send_and_await(&teleport_command(player), |line| line.contains(&marker))
            .await?;

        Ok(line.and_then(|line| parse_teleport_line(&line, player)))
    }
}

/// Locate the response to `command` in a console snapshot.
///
/// The last line equal to the command (both trimmed) is taken as its echo;
/// lines after it are scanned newest first.
pub fn find_response<'l, S, P>(lines: &'l [S], command: &str, predicate: P) -> Option<&'l str>
where
    S: AsRef<str>,
    P: Fn(&str) -> bool,
{
    let command = command.trim();
    let echo = lines
        .iter()
        .rposition(|line| line.as_ref().trim() == command)?;

    lines[echo + 1..]
        .iter()
        .rev()
        .map(AsRef::<str>::as_ref)
        .find(|&line| predicate(line))
}

/// Console command that makes the server print a player's position.
pub fn teleport_command(player: &str) -> String {
    format!("execute as {player} at {player} run tp ~ ~ ~")
}

fn teleport_marker(player: &str) -> String {
    format!("Teleported {player} to")
}

/// Extract `x, y, z` from a `Teleported <player> to x, y, z` line.
pub fn parse_teleport_line(line: &str, player: &str) -> Option<Coordinate> {
    let (_, rest) = line.split_once(&teleport_marker(player))?;

    let mut parts = rest.split(',').map(|part| part.trim().parse::<f64>());
    let (Some(Ok(x)), Some(Ok(y)), Some(Ok(z)), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return None;
    };

    Some(Coordinate { x, y, z })
}

#[track_caller]
fn validate_player(player: &str) -> Result<()> {
    if player.is_empty() || player.chars().any(char::is_whitespace) {
        return Err(SupervisorError::invalid_argument(format!(
            "'{player}' is not a valid player name"
        )));
    }
    Ok(())
}
