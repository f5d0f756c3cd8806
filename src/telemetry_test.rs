use std::collections::HashMap;

use serde_json::json;

use super::*;
use crate::clock::{Clock, ManualClock};
use crate::medium::MemoryMedium;
use crate::preferences::UserPreferences;

struct Fixture {
    clock: ManualClock,
    transport: MemoryTransport,
    store: Store,
    telemetry: Telemetry,
}

fn fixture(batch_size: usize, buffer_limit: usize) -> Fixture {
    let config = StoreConfig {
        telemetry_batch_size: batch_size,
        telemetry_buffer_limit: buffer_limit,
        ..StoreConfig::default()
    };
    let clock = ManualClock::new(1_000);
    let transport = MemoryTransport::new();
    let store = Store::new(
        Box::new(MemoryMedium::new()),
        Box::new(MemoryMedium::new()),
        Rc::new(clock.clone()),
        &config,
    );
    let telemetry = Telemetry::new(Box::new(transport.clone()), &config);
    Fixture { clock, transport, store, telemetry }
}

// =============================================================
// Metadata
// =============================================================

#[test]
fn metadata_keeps_serializable_values() {
    let meta = Metadata::new()
        .with("page", "/services")
        .with("ms", &12.5)
        .with("tags", &vec!["a", "b"]);
    assert_eq!(meta.len(), 3);
    assert_eq!(
        Value::Object(meta.into_map()),
        json!({"page": "/services", "ms": 12.5, "tags": ["a", "b"]})
    );
}

#[test]
fn metadata_drops_unserializable_values() {
    let mut bad: HashMap<(u8, u8), u8> = HashMap::new();
    bad.insert((1, 1), 1);
    let meta = Metadata::new().with("ok", &1).with("bad", &bad);
    assert_eq!(meta.len(), 1);
    assert!(!meta.into_map().contains_key("bad"));
}

#[test]
fn metadata_from_map() {
    let mut map = Map::new();
    map.insert("k".into(), json!(true));
    assert_eq!(Metadata::from(map).len(), 1);
    assert!(Metadata::new().is_empty());
}

// =============================================================
// Recording and batching
// =============================================================

#[test]
fn track_records_event_with_session_and_time() {
    let f = fixture(1, 10);
    let tracker = PerformanceTracker::new(&f.telemetry, &f.store);
    tracker.track("cta_click", Metadata::new().with("vertical", "gym"));

    let sent = f.transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].name, "cta_click");
    assert_eq!(sent[0].timestamp, 1_000);
    assert_eq!(sent[0].session_id, Some(Session::new(&f.store).id()));
    assert_eq!(sent[0].metadata.get("vertical"), Some(&json!("gym")));
}

#[test]
fn events_are_forwarded_in_batches() {
    let f = fixture(3, 10);
    let tracker = PerformanceTracker::new(&f.telemetry, &f.store);
    tracker.track("a", Metadata::new());
    tracker.track("b", Metadata::new());
    assert_eq!(f.transport.batches(), 0);
    assert_eq!(f.telemetry.pending_len(), 2);

    tracker.track("c", Metadata::new());
    assert_eq!(f.transport.batches(), 1);
    assert_eq!(f.telemetry.pending_len(), 0);
    let names: Vec<String> = f.transport.sent().into_iter().map(|e| e.name).collect();
    assert_eq!(names, vec!["a", "b", "c"]);
}

#[test]
fn flush_forwards_partial_batch_and_empty_flush_is_noop() {
    let f = fixture(5, 10);
    let tracker = PerformanceTracker::new(&f.telemetry, &f.store);
    tracker.flush();
    assert_eq!(f.transport.batches(), 0);
    tracker.track("a", Metadata::new());
    tracker.flush();
    assert_eq!(f.transport.batches(), 1);
    assert_eq!(f.transport.sent().len(), 1);
}

#[test]
fn transport_failure_is_swallowed_and_not_retried() {
    let f = fixture(1, 10);
    let tracker = PerformanceTracker::new(&f.telemetry, &f.store);
    f.transport.set_failing(true);
    tracker.track("lost", Metadata::new());
    assert_eq!(f.telemetry.pending_len(), 0);

    f.transport.set_failing(false);
    tracker.track("kept", Metadata::new());
    let names: Vec<String> = f.transport.sent().into_iter().map(|e| e.name).collect();
    assert_eq!(names, vec!["kept"]);
}

#[test]
fn recent_ring_is_bounded() {
    let f = fixture(2, 3);
    let tracker = PerformanceTracker::new(&f.telemetry, &f.store);
    for name in ["1", "2", "3", "4", "5"] {
        tracker.track(name, Metadata::new());
    }
    let names: Vec<String> = f.telemetry.recent().into_iter().map(|e| e.name).collect();
    assert_eq!(names, vec!["3", "4", "5"]);
}

#[test]
fn time_records_duration() {
    let f = fixture(1, 10);
    let tracker = PerformanceTracker::new(&f.telemetry, &f.store);
    let started = f.clock.now_ms();
    f.clock.advance(42);
    tracker.time("hero_render", started, Metadata::new().with("page", "/"));
    let sent = f.transport.sent();
    assert_eq!(sent[0].metadata.get("duration_ms"), Some(&json!(42)));
    assert_eq!(sent[0].metadata.get("page"), Some(&json!("/")));
}

#[test]
fn time_never_reports_negative_duration() {
    let f = fixture(1, 10);
    let tracker = PerformanceTracker::new(&f.telemetry, &f.store);
    tracker.time("skewed", f.clock.now_ms() + 500, Metadata::new());
    assert_eq!(f.transport.sent()[0].metadata.get("duration_ms"), Some(&json!(0)));
}

#[test]
fn declined_analytics_suppresses_events() {
    let f = fixture(1, 10);
    Preferences::new(&f.store).save(&UserPreferences {
        analytics_consent: Some(false),
        ..UserPreferences::default()
    });
    PerformanceTracker::new(&f.telemetry, &f.store).track("page_view", Metadata::new());
    assert!(f.transport.sent().is_empty());
    assert!(f.telemetry.recent().is_empty());
}

#[test]
fn log_transport_accepts_any_batch() {
    let event = TelemetryEvent {
        name: "x".into(),
        timestamp: 0,
        session_id: None,
        metadata: Map::new(),
    };
    assert!(LogTransport.send(&[event]).is_ok());
    assert!(LogTransport.send(&[]).is_ok());
}
