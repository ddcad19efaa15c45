//! Integration tests against a live Redis (`REDIS_URL`, default localhost).
//!
//! Every test works in its own table namespace and skips when no server
//! answers.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::Utc;
use kvmigrate::{
    ConnectionManager, Definition, Execution, MigrateError, Migrator, RedisVersionStore, StoreError,
    VersionRecord, VersionStore, cleanup_pattern, id::generate_run_id, keys::KeyContext,
};
use serial_test::serial;

async fn redis_connection() -> Option<ConnectionManager> {
    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".to_string());
    let client = redis::Client::open(url).ok()?;
    match tokio::time::timeout(Duration::from_secs(2), client.get_connection_manager()).await {
        Ok(Ok(conn)) => Some(conn),
        _ => {
            eprintln!("skipping: redis is not reachable");
            None
        }
    }
}

fn unique_table() -> String {
    format!("kvmigrate-test-{}", generate_run_id())
}

async fn cleanup(conn: &mut ConnectionManager, table: &str, sets: &[&str]) {
    let keys = KeyContext::new(table);
    for set in sets {
        cleanup_pattern(conn, &keys.set_pattern(set)).await.expect("cleanup");
    }
}

fn record(set: &str, version: u64, name: &str) -> VersionRecord {
    let execution = Execution {
        name: name.to_string(),
        fired_at: Utc::now(),
        elapsed: Duration::from_millis(7),
    };
    VersionRecord::new(set, version, &execution)
}

#[tokio::test]
#[serial]
async fn empty_table_has_no_latest_version() {
    let Some(conn) = redis_connection().await else { return };
    let store = RedisVersionStore::new(conn, unique_table());

    assert!(store.latest_version("fresh").await.unwrap().is_none());
    assert!(store.history("fresh").await.unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn commit_then_read_latest_and_history() {
    let Some(mut conn) = redis_connection().await else { return };
    let table = unique_table();
    let store = RedisVersionStore::new(conn.clone(), table.clone());

    store.commit(&record("users", 1, "#1 create users")).await.unwrap();
    store.commit(&record("users", 2, "#2 add index")).await.unwrap();

    let latest = store.latest_version("users").await.unwrap().unwrap();
    assert_eq!(latest.version_number, 2);
    assert_eq!(latest.name, "#2 add index");
    assert_eq!(latest.migration_set, "users");
    assert_eq!(latest.elapsed(), Duration::from_millis(7));

    let history = store.history("users").await.unwrap();
    let versions: Vec<_> = history.iter().map(|r| r.version_number).collect();
    assert_eq!(versions, vec![1, 2]);

    // Other sets in the same table are untouched.
    assert!(store.latest_version("orders").await.unwrap().is_none());

    cleanup(&mut conn, &table, &["users", "orders"]).await;
}

#[tokio::test]
#[serial]
async fn duplicate_version_is_rejected_and_original_kept() {
    let Some(mut conn) = redis_connection().await else { return };
    let table = unique_table();
    let store = RedisVersionStore::new(conn.clone(), table.clone());

    store.commit(&record("users", 1, "first")).await.unwrap();
    let err = store.commit(&record("users", 1, "second")).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::DuplicateVersion { ref migration_set, version_number: 1 } if migration_set == "users"
    ));

    let latest = store.latest_version("users").await.unwrap().unwrap();
    assert_eq!(latest.name, "first");

    cleanup(&mut conn, &table, &["users"]).await;
}

#[tokio::test]
#[serial]
async fn records_are_stored_as_json_with_persisted_field_names() {
    let Some(mut conn) = redis_connection().await else { return };
    let table = unique_table();
    let store = RedisVersionStore::new(conn.clone(), table.clone());

    store.commit(&record("users", 1, "#1 create users")).await.unwrap();

    let key = KeyContext::new(&table).version_record("users", 1);
    let raw: String = redis::cmd("GET").arg(&key).query_async(&mut conn).await.unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["migration_set"], "users");
    assert_eq!(json["version_number"], 1);
    assert_eq!(json["name"], "#1 create users");
    assert!(json["firedAt"].is_string());
    assert_eq!(json["elapsed"], 7_000_000);

    cleanup(&mut conn, &table, &["users"]).await;
}

#[tokio::test]
#[serial]
async fn migrator_runs_against_redis_and_is_idempotent() {
    let Some(mut conn) = redis_connection().await else { return };
    let table = unique_table();
    let migrator = Migrator::new(RedisVersionStore::new(conn.clone(), table.clone()));
    let counter = Arc::new(AtomicUsize::new(0));

    let defs: Vec<Definition> = ["#2 backfill", "#1 create"]
        .into_iter()
        .map(|name| {
            let counter = Arc::clone(&counter);
            Definition::new(name, move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
        })
        .collect();

    let summary = migrator.run("app", &defs).await.unwrap();
    assert_eq!((summary.starting_version, summary.current_version), (0, 2));

    let summary = migrator.run("app", &defs).await.unwrap();
    assert_eq!((summary.starting_version, summary.current_version), (2, 2));
    assert!(summary.executions.is_empty());
    assert_eq!(counter.load(Ordering::SeqCst), 2);

    let err = migrator.run("app", &defs[1..]).await.unwrap_err();
    assert!(matches!(err, MigrateError::MigrationHole { defined: 1, applied: 2 }));

    cleanup(&mut conn, &table, &["app"]).await;
}

#[tokio::test]
#[serial]
async fn failing_migration_is_not_recorded() {
    let Some(mut conn) = redis_connection().await else { return };
    let table = unique_table();
    let store = RedisVersionStore::new(conn.clone(), table.clone());
    let migrator = Migrator::new(store.clone());

    let defs = vec![
        Definition::new("#2 broken", || async { Err::<(), _>(anyhow::anyhow!("boom")) }),
        Definition::new("#1 fine", || async { Ok(()) }),
    ];

    let err = migrator.run("app", &defs).await.unwrap_err();
    let summary = err.summary().expect("partial summary");
    assert_eq!(summary.current_version, 1);
    assert_eq!(summary.executions.len(), 1);

    let latest = store.latest_version("app").await.unwrap().unwrap();
    assert_eq!(latest.version_number, 1);
    assert_eq!(latest.name, "#1 fine");

    cleanup(&mut conn, &table, &["app"]).await;
}

#[tokio::test]
#[serial]
async fn concurrent_commits_of_one_version_admit_exactly_one() {
    let Some(mut conn) = redis_connection().await else { return };
    let Some(other_conn) = redis_connection().await else { return };
    let table = unique_table();
    let left = RedisVersionStore::new(conn.clone(), table.clone());
    let right = RedisVersionStore::new(other_conn, table.clone());

    for version in 1..=20 {
        let left_record = record("race", version, "left");
        let right_record = record("race", version, "right");
        let (left_result, right_result) = tokio::join!(left.commit(&left_record), right.commit(&right_record));

        let rejected: Vec<_> = [&left_result, &right_result]
            .into_iter()
            .filter_map(|result| result.as_ref().err())
            .collect();
        assert_eq!(rejected.len(), 1, "version {version}: {left_result:?} / {right_result:?}");
        assert!(rejected[0].is_duplicate_version());

        let winner = if left_result.is_ok() { "left" } else { "right" };
        let latest = left.latest_version("race").await.unwrap().unwrap();
        assert_eq!((latest.version_number, latest.name.as_str()), (version, winner));
    }

    assert_eq!(right.history("race").await.unwrap().len(), 20);

    cleanup(&mut conn, &table, &["race"]).await;
}
