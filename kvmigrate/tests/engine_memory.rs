use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use kvmigrate::{
    Definition, MemoryVersionStore, MigrateError, Migrator, StoreError, VersionStore,
};

fn counting(name: &str, counter: &Arc<AtomicUsize>) -> Definition {
    let counter = Arc::clone(counter);
    Definition::new(name, move || {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    })
}

fn yielding(name: &str, counter: &Arc<AtomicUsize>) -> Definition {
    let counter = Arc::clone(counter);
    Definition::new(name, move || {
        let counter = Arc::clone(&counter);
        async move {
            tokio::task::yield_now().await;
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    })
}

#[tokio::test]
async fn growing_definition_list_applies_only_new_migrations() {
    let store = MemoryVersionStore::new();
    let migrator = Migrator::new(store.clone());
    let counter = Arc::new(AtomicUsize::new(0));

    let first = vec![counting("#1 create users", &counter)];
    let summary = migrator.run("users", &first).await.unwrap();
    assert_eq!((summary.starting_version, summary.current_version), (0, 1));

    let second = vec![
        counting("#3 drop legacy field", &counter),
        counting("#2 add email index", &counter),
        counting("#1 create users", &counter),
    ];
    let summary = migrator.run("users", &second).await.unwrap();
    assert_eq!((summary.starting_version, summary.current_version), (1, 3));
    let names: Vec<_> = summary.executions.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["#2 add email index", "#3 drop legacy field"]);
    assert_eq!(counter.load(Ordering::SeqCst), 3);

    let history = store.history("users").await.unwrap();
    let versions: Vec<_> = history.iter().map(|r| (r.version_number, r.name.as_str())).collect();
    assert_eq!(
        versions,
        vec![
            (1, "#1 create users"),
            (2, "#2 add email index"),
            (3, "#3 drop legacy field"),
        ]
    );
}

#[tokio::test]
async fn migration_sets_are_tracked_independently() {
    let store = MemoryVersionStore::new();
    let migrator = Migrator::new(store.clone());
    let counter = Arc::new(AtomicUsize::new(0));

    let orders = vec![counting("#2 orders b", &counter), counting("#1 orders a", &counter)];
    let users = vec![counting("#1 users a", &counter)];

    migrator.run("orders", &orders).await.unwrap();
    let summary = migrator.run("users", &users).await.unwrap();
    assert_eq!(summary.starting_version, 0);
    assert_eq!(summary.current_version, 1);

    assert_eq!(store.len("orders"), 2);
    assert_eq!(store.len("users"), 1);
    let latest = store.latest_version("orders").await.unwrap().unwrap();
    assert_eq!(latest.version_number, 2);
    assert_eq!(latest.name, "#2 orders b");
}

#[tokio::test]
async fn removed_definition_is_detected_as_hole() {
    let store = MemoryVersionStore::new();
    let migrator = Migrator::new(store.clone());
    let counter = Arc::new(AtomicUsize::new(0));

    let defs = vec![counting("#2 b", &counter), counting("#1 a", &counter)];
    migrator.run("set", &defs).await.unwrap();

    let err = migrator.run("set", &defs[..1]).await.unwrap_err();
    assert!(matches!(err, MigrateError::MigrationHole { defined: 1, applied: 2 }));
    assert!(err.summary().is_none());
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn plan_then_run_agree() {
    let store = MemoryVersionStore::new();
    let migrator = Migrator::new(store.clone());
    let counter = Arc::new(AtomicUsize::new(0));
    let defs = vec![
        counting("#3 c", &counter),
        counting("#2 b", &counter),
        counting("#1 a", &counter),
    ];
    migrator.run("set", &defs[2..]).await.unwrap();

    let plan = migrator.plan("set", &defs).await.unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    let planned: Vec<_> = plan.pending.iter().map(|p| p.name.clone()).collect();

    let summary = migrator.run("set", &defs).await.unwrap();
    let applied: Vec<_> = summary.executions.iter().map(|e| e.name.clone()).collect();
    assert_eq!(planned, applied);
    assert_eq!(plan.target_version, summary.current_version);
}

#[tokio::test]
async fn concurrent_runners_record_each_version_once() {
    let store = MemoryVersionStore::new();
    let left = Migrator::new(store.clone());
    let right = Migrator::new(store.clone());
    let counter = Arc::new(AtomicUsize::new(0));
    let defs = vec![yielding("#1 init", &counter)];

    let (left_result, right_result) = tokio::join!(left.run("race", &defs), right.run("race", &defs));

    let (won, lost) = match (left_result, right_result) {
        (Ok(summary), Err(err)) | (Err(err), Ok(summary)) => (summary, err),
        other => panic!("expected exactly one winner, got {other:?}"),
    };

    assert_eq!(won.current_version, 1);
    match lost {
        MigrateError::CommitFailed {
            version_number,
            source,
            summary,
            ..
        } => {
            assert_eq!(version_number, 1);
            assert!(matches!(source, StoreError::DuplicateVersion { version_number: 1, .. }));
            assert!(summary.executions.is_empty());
        }
        other => panic!("expected CommitFailed, got {other:?}"),
    }

    // Both actions ran; only one of them is on record.
    assert_eq!(counter.load(Ordering::SeqCst), 2);
    assert_eq!(store.len("race"), 1);
}
