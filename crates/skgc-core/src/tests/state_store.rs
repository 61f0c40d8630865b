use crate::tests::FakeLiveness;
use crate::{Edition, ServerRecord, StateStore, SupervisorError};

use googletest::assert_that;
use googletest::prelude::{contains_substring, eq, err, none, pat, some};
use tempfile::TempDir;

fn store_in(temp: &TempDir, oracle: std::sync::Arc<FakeLiveness>) -> StateStore {
    StateStore::with_oracle(temp.path().join("skgc.json"), oracle)
}

// =========================================================================
// Persistence
// =========================================================================

#[test]
fn given_saved_record_when_load_then_round_trips() {
    // Given
    let temp = TempDir::new().unwrap();
    let store = store_in(&temp, FakeLiveness::with_alive(&[]));
    let mut record = ServerRecord::new(Edition::Java, "lobby");
    record.misc.insert("owner".into(), serde_json::json!("alice"));

    // When
    store.save(&record).unwrap();
    let loaded = store.load().unwrap();

    // Then
    assert_eq!(loaded, record);
}

#[test]
fn given_no_record_when_load_then_not_initialized() {
    // Given
    let temp = TempDir::new().unwrap();
    let store = store_in(&temp, FakeLiveness::with_alive(&[]));

    // When
    let result = store.load();

    // Then
    assert_that!(result, err(pat!(SupervisorError::NotInitialized { .. })));
}

#[test]
fn given_corrupt_record_when_load_then_json_error_names_file() {
    // Given
    let temp = TempDir::new().unwrap();
    let store = store_in(&temp, FakeLiveness::with_alive(&[]));
    std::fs::write(store.path(), "{ not json").unwrap();

    // When
    let result = store.load();

    // Then
    let error = result.unwrap_err();
    assert!(matches!(error, SupervisorError::Json { .. }));
    assert_that!(error.to_string(), contains_substring("skgc.json"));
}

#[test]
fn given_concurrent_saves_when_reading_then_every_read_sees_a_whole_record() {
    // Given
    let temp = TempDir::new().unwrap();
    store_in(&temp, FakeLiveness::with_alive(&[]))
        .save(&ServerRecord::new(Edition::Java, "start"))
        .unwrap();

    // When
    let reads = std::thread::scope(|scope| {
        for writer in 0..2 {
            let temp = &temp;
            scope.spawn(move || {
                let store = store_in(temp, FakeLiveness::with_alive(&[]));
                let mut record = ServerRecord::new(Edition::Java, "start");
                for round in 0..100 {
                    record.alias = format!("writer-{writer}-{round}-{}", "x".repeat(round));
                    store.save(&record).unwrap();
                }
            });
        }

        let reader = scope.spawn(|| {
            let store = store_in(&temp, FakeLiveness::with_alive(&[]));
            (0..300).map(|_| store.load_raw()).collect::<Vec<_>>()
        });
        reader.join().unwrap()
    });

    // Then
    for read in reads {
        let record = read.unwrap();
        assert!(record.alias == "start" || record.alias.starts_with("writer-"));
    }
}

#[test]
fn given_several_saves_when_listing_dir_then_no_temp_files_left() {
    // Given
    let temp = TempDir::new().unwrap();
    let store = store_in(&temp, FakeLiveness::with_alive(&[]));
    let mut record = ServerRecord::new(Edition::Bedrock, "survival");

    // When
    for alias in ["a", "b", "c"] {
        record.alias = alias.to_string();
        store.save(&record).unwrap();
    }

    // Then
    let names: Vec<String> = std::fs::read_dir(temp.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec![String::from("skgc.json")]);
    assert_that!(store.load_raw().unwrap().alias, eq("c"));
}

#[test]
fn given_record_written_by_other_tool_when_load_then_optional_fields_default() {
    // Given
    let temp = TempDir::new().unwrap();
    let store = store_in(&temp, FakeLiveness::with_alive(&[]));
    std::fs::write(
        store.path(),
        r#"{
            "init_id": "abc",
            "edition": "java",
            "alias": "old",
            "start_command": "java -jar server.jar nogui",
            "stop_command": "stop",
            "status": false
        }"#,
    )
    .unwrap();

    // When
    let record = store.load().unwrap();

    // Then
    assert_that!(record.pid, none());
    assert!(record.misc.is_empty());
}

// =========================================================================
// Reconciliation
// =========================================================================

#[test]
fn given_running_record_with_dead_pid_when_load_then_stopped_and_persisted() {
    // Given
    let temp = TempDir::new().unwrap();
    let oracle = FakeLiveness::with_alive(&[4242]);
    let store = store_in(&temp, oracle.clone());
    let mut record = ServerRecord::new(Edition::Java, "lobby");
    record.mark_running(4242);
    store.save(&record).unwrap();
    oracle.kill(4242);

    // When
    let loaded = store.load().unwrap();

    // Then
    assert!(!loaded.status);
    assert_that!(loaded.pid, none());
    let persisted = store.load_raw().unwrap();
    assert!(!persisted.status);
    assert_that!(persisted.pid, none());
}

#[test]
fn given_running_record_with_live_pid_when_load_then_unchanged() {
    // Given
    let temp = TempDir::new().unwrap();
    let store = store_in(&temp, FakeLiveness::with_alive(&[77]));
    let mut record = ServerRecord::new(Edition::Java, "lobby");
    record.mark_running(77);
    store.save(&record).unwrap();

    // When
    let loaded = store.load().unwrap();

    // Then
    assert!(loaded.status);
    assert_that!(loaded.pid, some(eq(77)));
}

#[test]
fn given_running_record_without_pid_when_reconcile_then_stopped() {
    // Given
    let oracle = FakeLiveness::with_alive(&[]);
    let mut record = ServerRecord::new(Edition::Bedrock, "x");
    record.status = true;

    // When
    let changed = record.reconcile(oracle.as_ref());

    // Then
    assert!(changed);
    assert!(!record.status);
}

#[test]
fn given_stopped_record_when_reconcile_then_not_changed() {
    // Given
    let oracle = FakeLiveness::with_alive(&[]);
    let mut record = ServerRecord::new(Edition::Java, "x");

    // When
    let changed = record.reconcile(oracle.as_ref());

    // Then
    assert!(!changed);
    assert!(!record.status);
    assert_that!(record.pid, none());
}
