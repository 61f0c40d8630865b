use crate::tests::{FakeLiveness, force_running, setup_manager};
use crate::{
    CommandBuffer, CommandCorrelator, ConsoleLog, Coordinate, Edition, SupervisorError,
    find_response, parse_teleport_line, teleport_command,
};

use std::time::Duration;

use googletest::assert_that;
use googletest::prelude::{eq, none, some};

const PID: u32 = 31337;

// =========================================================================
// Response scan
// =========================================================================

#[test]
fn given_two_echoes_when_find_response_then_scans_after_last_echo_newest_first() {
    // Given
    let lines = [
        "list",
        "There are 3 of a max of 20 players online",
        "list",
        "There are 1 of a max of 20 players online",
        "There are 2 of a max of 20 players online",
    ];

    // When
    let found = find_response(&lines, "list", |line| line.starts_with("There are"));

    // Then
    assert_that!(found, some(eq("There are 2 of a max of 20 players online")));
}

#[test]
fn given_match_only_before_echo_when_find_response_then_none() {
    // Given
    let lines = ["Teleported Steve to 1.0, 2.0, 3.0", "  tp Steve  ", "Done"];

    // When
    let found = find_response(&lines, "tp Steve", |line| line.contains("Teleported"));

    // Then
    assert_that!(found, none());
}

#[test]
fn given_no_echo_when_find_response_then_none() {
    // Given
    let lines = vec![String::from("Teleported Steve to 1.0, 2.0, 3.0")];

    // When
    let found = find_response(&lines, "tp Steve", |_| true);

    // Then
    assert_that!(found, none());
}

#[test]
fn given_teleport_line_when_parse_then_coordinate() {
    // Given
    let line = "[12:00:01] [Server thread/INFO]: Teleported Steve to 12.0, 64.0, -3.5";

    // When
    let coordinate = parse_teleport_line(line, "Steve");

    // Then
    assert_eq!(
        coordinate,
        Some(Coordinate {
            x: 12.0,
            y: 64.0,
            z: -3.5
        })
    );
}

#[test]
fn given_unparseable_coordinates_when_parse_then_none() {
    assert_that!(parse_teleport_line("Teleported Steve to 1.0, up, 3.0", "Steve"), none());
    assert_that!(parse_teleport_line("Teleported Steve to 1.0, 2.0", "Steve"), none());
    assert_that!(parse_teleport_line("Teleported Alex to 1.0, 2.0, 3.0", "Steve"), none());
}

// =========================================================================
// Coordinate query against a simulated console
// =========================================================================

/// Stand-in for the forward loop plus a server that answers teleports.
async fn answer_teleport(log: ConsoleLog, buffer: CommandBuffer, reply: &'static str) {
    for _ in 0..50 {
        if let Some(command) = buffer.take_first().await.unwrap() {
            log.append_line(&command).await.unwrap();
            log.append_line(reply).await.unwrap();
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn given_running_server_when_query_coordinate_then_parses_reply_after_echo() {
    // Given
    let (temp, manager, _) = setup_manager(Edition::Java, FakeLiveness::with_alive(&[PID]));
    force_running(&temp, PID);
    let log = manager.console_log().clone();
    log.append_line("[Server thread/INFO]: Done (3.2s)!").await.unwrap();
    log.append_line("Teleported Steve to 0.0, 0.0, 0.0").await.unwrap();
    let responder = tokio::spawn(answer_teleport(
        log.clone(),
        manager.command_buffer().clone(),
        "[Server thread/INFO]: Teleported Steve to 12.0, 64.0, -3.5",
    ));

    // When
    let correlator = CommandCorrelator::with_settle_delay(&manager, Duration::from_millis(200));
    let coordinate = correlator.query_coordinate("Steve").await.unwrap();

    // Then
    responder.await.unwrap();
    assert_eq!(
        coordinate,
        Some(Coordinate {
            x: 12.0,
            y: 64.0,
            z: -3.5
        })
    );
    let lines = log.read_lines().await.unwrap();
    assert!(lines.contains(&teleport_command("Steve")));
}

#[tokio::test]
async fn given_server_never_echoes_when_query_coordinate_then_none() {
    // Given
    let (temp, manager, _) = setup_manager(Edition::Bedrock, FakeLiveness::with_alive(&[PID]));
    force_running(&temp, PID);
    manager
        .console_log()
        .append_line("Teleported Steve to 1.0, 2.0, 3.0")
        .await
        .unwrap();

    // When
    let correlator = CommandCorrelator::with_settle_delay(&manager, Duration::from_millis(20));
    let coordinate = correlator.query_coordinate("Steve").await.unwrap();

    // Then
    assert_that!(coordinate, none());
    let pending = manager.command_buffer().peek().await.unwrap();
    assert_eq!(pending, format!("{}\n", teleport_command("Steve")));
}

#[tokio::test]
async fn given_stopped_server_when_query_coordinate_then_not_running() {
    // Given
    let (_temp, manager, _) = setup_manager(Edition::Java, FakeLiveness::with_alive(&[]));

    // When
    let result = CommandCorrelator::new(&manager).query_coordinate("Steve").await;

    // Then
    assert!(matches!(result, Err(SupervisorError::NotRunning { .. })));
}

#[tokio::test]
async fn given_player_name_with_space_when_query_coordinate_then_invalid_argument() {
    // Given
    let (temp, manager, _) = setup_manager(Edition::Java, FakeLiveness::with_alive(&[PID]));
    force_running(&temp, PID);

    // When
    let result = CommandCorrelator::new(&manager)
        .query_coordinate("Steve run stop")
        .await;

    // Then
    assert!(matches!(result, Err(SupervisorError::InvalidArgument { .. })));
    assert!(manager.command_buffer().peek().await.unwrap().is_empty());
}
