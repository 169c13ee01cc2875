use crate::engine::SqliteStore;
use crate::{AlertQuery, AlertStore, MuteStore};
use serde_json::json;
use sitemon_common::clock::{Clock, ManualClock};
use sitemon_common::types::{AlertMetadata, NewAlert, Severity};
use std::sync::Arc;
use tempfile::TempDir;

fn setup() -> (TempDir, Arc<ManualClock>, SqliteStore) {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::new(1_000));
    let store = SqliteStore::open(&dir.path().join("alerts.db"), clock.clone()).unwrap();
    (dir, clock, store)
}

fn new_alert(target: &str, severity: Severity, reason: &str) -> NewAlert {
    NewAlert {
        target_id: target.to_string(),
        severity,
        reason: reason.to_string(),
        metadata: None,
    }
}

#[test]
fn add_alert_assigns_increasing_ids_and_clock_time() {
    let (_dir, clock, store) = setup();

    let first = store
        .add_alert(&new_alert("site-a", Severity::Critical, "Status 500"))
        .unwrap();
    clock.advance(10);
    let second = store
        .add_alert(&new_alert("site-a", Severity::Critical, "Status 500"))
        .unwrap();

    assert!(second.id > first.id);
    assert_eq!(first.raised_at, 1_000);
    assert_eq!(second.raised_at, 1_010);
    assert!(!first.acknowledged);
}

#[test]
fn metadata_round_trips_through_storage() {
    let (_dir, _clock, store) = setup();

    let mut metadata = AlertMetadata::new();
    metadata.insert("latency".into(), json!(1500.25));
    let alert = store
        .add_alert(&NewAlert {
            metadata: Some(metadata.clone()),
            ..new_alert("site-a", Severity::Warning, "High latency > 1000ms")
        })
        .unwrap();

    let loaded = store.get_alert(alert.id).unwrap().expect("alert should exist");
    assert_eq!(loaded, alert);
    assert_eq!(loaded.metadata, Some(metadata));

    let bare = store
        .add_alert(&new_alert("site-a", Severity::Critical, "Status 503"))
        .unwrap();
    assert_eq!(store.get_alert(bare.id).unwrap().unwrap().metadata, None);
}

#[test]
fn get_alert_missing_returns_none() {
    let (_dir, _clock, store) = setup();
    assert!(store.get_alert(42).unwrap().is_none());
}

#[test]
fn list_alerts_most_recent_first_with_limit() {
    let (_dir, clock, store) = setup();
    for i in 0..5 {
        store
            .add_alert(&new_alert("site-a", Severity::Warning, &format!("alert {i}")))
            .unwrap();
        clock.advance(100);
    }

    let all = store.list_alerts(&AlertQuery::new(100)).unwrap();
    assert_eq!(all.len(), 5);
    assert!(all.windows(2).all(|w| w[0].raised_at >= w[1].raised_at));
    assert_eq!(all[0].reason, "alert 4");

    let limited = store.list_alerts(&AlertQuery::new(2)).unwrap();
    assert_eq!(limited.len(), 2);
    assert_eq!(limited[0].reason, "alert 4");
    assert_eq!(limited[1].reason, "alert 3");

    assert!(store.list_alerts(&AlertQuery::new(0)).unwrap().is_empty());
}

#[test]
fn list_alerts_breaks_timestamp_ties_by_id() {
    let (_dir, _clock, store) = setup();
    let first = store
        .add_alert(&new_alert("site-a", Severity::Critical, "Status 500"))
        .unwrap();
    let second = store
        .add_alert(&new_alert("site-a", Severity::Critical, "3 consecutive failures"))
        .unwrap();

    let listed = store.list_alerts(&AlertQuery::new(10)).unwrap();
    assert_eq!(listed[0].id, second.id);
    assert_eq!(listed[1].id, first.id);
}

#[test]
fn list_alerts_filters_combine() {
    let (_dir, clock, store) = setup();
    store
        .add_alert(&new_alert("site-a", Severity::Warning, "old a"))
        .unwrap();
    store
        .add_alert(&new_alert("site-b", Severity::Warning, "old b"))
        .unwrap();
    clock.set(5_000);
    store
        .add_alert(&new_alert("site-a", Severity::Critical, "new a"))
        .unwrap();
    store
        .add_alert(&new_alert("site-b", Severity::Critical, "new b"))
        .unwrap();

    let for_a = store
        .list_alerts(&AlertQuery::new(10).for_target("site-a"))
        .unwrap();
    assert_eq!(for_a.len(), 2);
    assert!(for_a.iter().all(|a| a.target_id == "site-a"));
    assert_eq!(for_a[0].reason, "new a");

    // since_time is inclusive
    let recent = store.list_alerts(&AlertQuery::new(10).since(5_000)).unwrap();
    assert_eq!(recent.len(), 2);

    let both = store
        .list_alerts(&AlertQuery::new(10).since(5_000).for_target("site-b"))
        .unwrap();
    assert_eq!(both.len(), 1);
    assert_eq!(both[0].reason, "new b");

    let none = store
        .list_alerts(&AlertQuery::new(10).for_target("site-z"))
        .unwrap();
    assert!(none.is_empty());
}

#[test]
fn acknowledge_is_idempotent() {
    let (_dir, _clock, store) = setup();
    let alert = store
        .add_alert(&new_alert("site-a", Severity::Critical, "Status 500"))
        .unwrap();

    assert!(store.acknowledge_alert(alert.id).unwrap());
    let after_first = store.get_alert(alert.id).unwrap().unwrap();
    assert!(after_first.acknowledged);

    assert!(store.acknowledge_alert(alert.id).unwrap());
    let after_second = store.get_alert(alert.id).unwrap().unwrap();
    assert_eq!(after_first, after_second);
    assert_eq!(after_second.raised_at, alert.raised_at);
}

#[test]
fn acknowledge_unknown_alert_returns_false() {
    let (_dir, _clock, store) = setup();
    assert!(!store.acknowledge_alert(999).unwrap());
}

#[test]
fn ping_succeeds_on_open_store() {
    let (_dir, _clock, store) = setup();
    store.ping().unwrap();
    assert!(store.list_alerts(&AlertQuery::new(10)).unwrap().is_empty());
}

#[test]
fn mute_expires_strictly_at_until() {
    let (_dir, clock, store) = setup();
    let mute = store.mute("site-a", 2_000, Some("deploy")).unwrap();
    assert_eq!(mute.created_at, 1_000);
    assert_eq!(mute.reason.as_deref(), Some("deploy"));

    assert!(store.is_muted("site-a", clock.now_millis()).unwrap());
    assert!(store.is_muted("site-a", 1_999).unwrap());
    assert!(!store.is_muted("site-a", 2_000).unwrap());
    assert!(!store.is_muted("site-b", 1_500).unwrap());
}

#[test]
fn overlapping_mutes_coexist() {
    let (_dir, _clock, store) = setup();
    let short = store.mute("site-a", 1_500, None).unwrap();
    let long = store.mute("site-a", 3_000, Some("maintenance")).unwrap();
    assert_ne!(short.id, long.id);

    let active = store.active_mutes("site-a", 1_200).unwrap();
    assert_eq!(active.len(), 2);
    assert_eq!(active[0].id, long.id);

    let later = store.active_mutes("site-a", 2_000).unwrap();
    assert_eq!(later.len(), 1);
    assert!(store.is_muted("site-a", 2_000).unwrap());
    assert!(store.active_mutes("site-a", 3_000).unwrap().is_empty());
}

#[test]
fn mute_in_the_past_is_never_active() {
    let (_dir, _clock, store) = setup();
    store.mute("site-a", 500, None).unwrap();
    assert!(!store.is_muted("site-a", 1_000).unwrap());
}

#[test]
fn data_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("alerts.db");
    let clock = Arc::new(ManualClock::new(1_000));

    let alert_id = {
        let store = SqliteStore::open(&path, clock.clone()).unwrap();
        store.mute("site-a", 9_000, None).unwrap();
        store
            .add_alert(&new_alert("site-a", Severity::Warning, "High latency > 1000ms"))
            .unwrap()
            .id
    };

    let store = SqliteStore::open(&path, clock).unwrap();
    assert!(store.get_alert(alert_id).unwrap().is_some());
    assert!(store.is_muted("site-a", 1_000).unwrap());

    let next = store
        .add_alert(&new_alert("site-a", Severity::Warning, "again"))
        .unwrap();
    assert!(next.id > alert_id);
}

#[test]
fn concurrent_adds_get_distinct_ids() {
    let clock = Arc::new(ManualClock::new(0));
    let store = Arc::new(SqliteStore::open_in_memory(clock).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let store = store.clone();
            std::thread::spawn(move || {
                (0..25)
                    .map(|i| {
                        store
                            .add_alert(&new_alert(
                                &format!("site-{t}"),
                                Severity::Warning,
                                &format!("alert {i}"),
                            ))
                            .unwrap()
                            .id
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut ids: Vec<i64> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 200);
    assert_eq!(store.list_alerts(&AlertQuery::new(1_000)).unwrap().len(), 200);
}
