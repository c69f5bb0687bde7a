//! Engine over a file-backed SQLite store.
//!
//! Checks that reconciliation and mutations survive a reopen of the
//! database, which the in-memory suites cannot show.
//!
//! Run with: `cargo test --test sqlite_sync`

use std::sync::Arc;

use tempfile::TempDir;

use follow_sync::{
    FollowCodec, FollowRecord, FollowSource, FollowSync, FollowSyncConfig, InMemoryRemote,
    LocalStore, ManualClock, PostcardCodec, ReconcileOutcome, SqliteStore, StaticToken,
};

fn db_url(dir: &TempDir) -> String {
    format!("sqlite://{}", dir.path().join("follow.db").display())
}

fn engine(store: Arc<SqliteStore>, remote: Arc<InMemoryRemote>, now: i64) -> FollowSync {
    FollowSync::new(FollowSyncConfig::default(), store, remote, Arc::new(StaticToken::new("t")))
        .unwrap()
        .with_clock(Arc::new(ManualClock::new(now)))
}

fn record(id: &str, time: i64) -> FollowRecord {
    FollowRecord {
        id: id.to_string(),
        name: format!("name {}", id),
        bio: "bio".to_string(),
        url: format!("https://img.example/{}", id),
        time,
    }
}

#[tokio::test]
async fn sqlite_replace_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let url = db_url(&dir);
    let remote = Arc::new(InMemoryRemote::with_payload(
        PostcardCodec.encode(700, &[record("a", 600), record("b", 650)]).unwrap(),
    ));

    {
        let store = Arc::new(SqliteStore::new(&url).await.unwrap());
        store.add(&record("stale", 1)).await.unwrap();
        store.set_clock_marker(1).await.unwrap();

        let engine = engine(store.clone(), remote.clone(), 1_000);
        let outcome = engine.reconcile().await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::Replaced { records: 2, remote_time: 700 });
        store.pool().close().await;
    }

    let reopened = SqliteStore::new(&url).await.unwrap();
    assert_eq!(reopened.clock_marker().await.unwrap(), Some(700));
    assert_eq!(reopened.count().await.unwrap(), 2);
    assert!(reopened.get("stale").await.unwrap().is_none());
    assert_eq!(reopened.get("b").await.unwrap(), Some(record("b", 650)));
}

#[tokio::test]
async fn sqlite_mutations_and_paging() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(SqliteStore::new(&db_url(&dir)).await.unwrap());
    store.set_clock_marker(1).await.unwrap();
    let clock = Arc::new(ManualClock::new(10_000));
    let engine = FollowSync::new(
        FollowSyncConfig::default(),
        store.clone(),
        Arc::new(InMemoryRemote::new()),
        Arc::new(StaticToken::new("t")),
    )
    .unwrap()
    .with_clock(clock.clone());

    for i in 0..60 {
        clock.advance(1);
        engine.add_or_update(&FollowSource::new(format!("u{:02}", i), "n", "")).await.unwrap();
    }
    // Re-follow moves the record to the front
    clock.advance(1);
    engine.add_or_update(&FollowSource::new("u00", "renamed", "")).await.unwrap();
    engine.delete("u59").await.unwrap();

    assert_eq!(engine.count().await.unwrap(), 59);
    let first = engine.page(0).await.unwrap();
    let second = engine.page(1).await.unwrap();
    assert_eq!(first.len(), 50);
    assert_eq!(second.len(), 9);
    assert_eq!(first[0].id, "u00");
    assert_eq!(first[0].name, "renamed");
    assert_eq!(first[1].id, "u58");
}

#[tokio::test]
async fn sqlite_clear_then_push_uploads_empty() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(SqliteStore::new(&db_url(&dir)).await.unwrap());
    store.add(&record("a", 5)).await.unwrap();
    store.set_clock_marker(5).await.unwrap();
    let remote = Arc::new(InMemoryRemote::new());
    let engine = engine(store.clone(), remote.clone(), 2_000);

    engine.clear().await.unwrap();
    let report = engine.flush_pending().await.unwrap().unwrap();

    assert_eq!(report.records, 0);
    let pushed = PostcardCodec.decode(&remote.payload().unwrap()).unwrap();
    assert_eq!(pushed.time, 2_000);
    assert!(pushed.is_empty());
}

#[tokio::test]
async fn sqlite_from_config_defaults_to_memory() {
    let store = SqliteStore::connect_with_config(&FollowSyncConfig::default()).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 0);
    assert_eq!(store.clock_marker().await.unwrap(), None);
}
