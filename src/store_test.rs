use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::*;
use crate::clock::ManualClock;
use crate::medium::MemoryMedium;

struct Fixture {
    session: MemoryMedium,
    persistent: MemoryMedium,
    clock: ManualClock,
    store: Store,
}

fn fixture_with(config: &StoreConfig) -> Fixture {
    let session = MemoryMedium::new();
    let persistent = MemoryMedium::new();
    let clock = ManualClock::new(1_000_000);
    let store = Store::new(
        Box::new(session.clone()),
        Box::new(persistent.clone()),
        Rc::new(clock.clone()),
        config,
    );
    Fixture { session, persistent, clock, store }
}

fn fixture() -> Fixture {
    fixture_with(&StoreConfig::default())
}

// =============================================================
// Round-trip
// =============================================================

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Nested {
    name: String,
    tags: Vec<String>,
    score: f64,
}

#[test]
fn values_round_trip_without_expiry() {
    let f = fixture();
    f.store.set("s", "hello", SetOptions::default());
    f.store.set("n", &42_i64, SetOptions::default());
    f.store.set("arr", &vec![1, 2, 3], SetOptions::session());
    let nested = Nested { name: "gym".into(), tags: vec!["a".into(), "b".into()], score: 0.5 };
    f.store.set("obj", &nested, SetOptions::default());

    f.clock.advance(365 * 24 * 60 * 60 * 1000);

    assert_eq!(f.store.get::<String>("s").as_deref(), Some("hello"));
    assert_eq!(f.store.get::<i64>("n"), Some(42));
    assert_eq!(f.store.get::<Vec<i32>>("arr"), Some(vec![1, 2, 3]));
    assert_eq!(f.store.get::<Nested>("obj"), Some(nested));
}

#[test]
fn missing_key_reads_none() {
    let f = fixture();
    assert_eq!(f.store.get::<String>("nope"), None);
}

#[test]
fn default_scope_is_persistent() {
    let f = fixture();
    f.store.set("k", &1, SetOptions::default());
    assert!(f.store.contains("k", Scope::Persistent));
    assert!(!f.store.contains("k", Scope::Session));
}

// =============================================================
// Expiry
// =============================================================

#[test]
fn expired_entry_reads_none_and_is_purged() {
    let f = fixture();
    f.store.set("promo", "spring", SetOptions::default().expires_in(5_000));
    assert_eq!(f.store.get::<String>("promo").as_deref(), Some("spring"));

    f.clock.advance(5_001);
    assert!(f.store.probe_raw("promo", Scope::Persistent).is_some(), "eviction is lazy");
    assert_eq!(f.store.get::<String>("promo"), None);
    assert_eq!(f.store.probe_raw("promo", Scope::Persistent), None);
    assert!(f.persistent.is_empty());
}

#[test]
fn entry_is_live_just_before_expiry() {
    let f = fixture();
    f.store.set("k", &true, SetOptions::session().expires_in(100));
    f.clock.advance(99);
    assert_eq!(f.store.get::<bool>("k"), Some(true));
    f.clock.advance(1);
    assert_eq!(f.store.get::<bool>("k"), None);
    assert!(f.session.is_empty());
}

#[test]
fn rewrite_makes_expired_key_fresh_again() {
    let f = fixture();
    f.store.set("k", &1, SetOptions::default().expires_in(10));
    f.clock.advance(20);
    f.store.set("k", &2, SetOptions::default().expires_in(10));
    assert_eq!(f.store.get::<i32>("k"), Some(2));
}

#[test]
fn entry_records_created_at() {
    let f = fixture();
    f.store.set("k", &1, SetOptions::default().expires_in(10));
    let entry = f.store.entry_in("k", Scope::Persistent).unwrap();
    assert_eq!(entry.created_at, 1_000_000);
    assert_eq!(entry.expires_at, Some(1_000_010));
}

// =============================================================
// Corruption
// =============================================================

#[test]
fn malformed_raw_value_reads_none_and_is_removed() {
    let f = fixture();
    f.persistent.set_item("site:broken", "{not json").unwrap();
    assert_eq!(f.store.get::<String>("broken"), None);
    assert_eq!(f.persistent.get_item("site:broken").unwrap(), None);
}

#[test]
fn value_of_wrong_shape_reads_none_and_is_removed() {
    let f = fixture();
    f.store.set("k", "text", SetOptions::default());
    assert_eq!(f.store.get::<Vec<u32>>("k"), None);
    assert!(f.persistent.is_empty());
}

#[test]
fn bare_json_without_envelope_is_corrupt() {
    let f = fixture();
    f.persistent.set_item("site:legacy", "\"Pro\"").unwrap();
    assert_eq!(f.store.get::<String>("legacy"), None);
}

// =============================================================
// Consent
// =============================================================

#[test]
fn consent_false_never_reaches_persistent_medium() {
    let f = fixture();
    f.store.set("visitor", "v1", SetOptions::default().consent(false));
    assert_eq!(f.store.get_in::<String>("visitor", Scope::Persistent), None);
    assert!(f.persistent.is_empty());
    // Degraded to the session under the default policy.
    assert_eq!(f.store.get::<String>("visitor").as_deref(), Some("v1"));
}

#[test]
fn consent_true_is_retrievable_from_persistent() {
    let f = fixture();
    f.store.set("visitor", "v1", SetOptions::default().consent(true));
    assert_eq!(f.store.get_in::<String>("visitor", Scope::Persistent).as_deref(), Some("v1"));
}

#[test]
fn drop_policy_discards_unconsented_write() {
    let config = StoreConfig { consent_policy: ConsentPolicy::Drop, ..StoreConfig::default() };
    let f = fixture_with(&config);
    let err = f.store.try_set("visitor", "v1", SetOptions::default().consent(false)).unwrap_err();
    assert!(matches!(err, StoreError::ConsentDenied { .. }));
    assert!(f.session.is_empty());
    assert!(f.persistent.is_empty());
}

#[test]
fn persistent_write_supersedes_degraded_session_copy() {
    let f = fixture();
    f.store.set("k", "old", SetOptions::default().consent(false));
    f.store.set("k", "new", SetOptions::default());
    assert_eq!(f.store.get::<String>("k").as_deref(), Some("new"));
    assert!(f.session.is_empty());
}

// =============================================================
// Unavailable media
// =============================================================

#[test]
fn quota_exceeded_write_is_a_noop() {
    let session = MemoryMedium::new();
    let persistent = MemoryMedium::with_quota(64);
    let store = Store::new(
        Box::new(session),
        Box::new(persistent.clone()),
        Rc::new(ManualClock::new(0)),
        &StoreConfig::default(),
    );
    store.set("big", &"x".repeat(500), SetOptions::default());
    assert_eq!(store.get::<String>("big"), None);
    let err = store.try_set("big", &"x".repeat(500), SetOptions::default()).unwrap_err();
    assert!(matches!(err, StoreError::QuotaExceeded { .. }));
    assert!(persistent.is_empty());
}

#[test]
fn disabled_medium_reads_none_and_writes_nothing() {
    let f = fixture();
    f.persistent.set_disabled(true);
    f.store.set("k", &1, SetOptions::default());
    assert_eq!(f.store.get::<i32>("k"), None);
    f.store.remove("k");
    f.store.clear(Scope::Persistent);
    assert!(f.store.keys_with_prefix(Scope::Persistent, "").is_empty());
    f.persistent.set_disabled(false);
    assert!(f.persistent.is_empty());
}

#[test]
fn unserializable_value_is_skipped() {
    let f = fixture();
    let mut bad: HashMap<(i32, i32), i32> = HashMap::new();
    bad.insert((1, 2), 3);
    f.store.set("bad", &bad, SetOptions::default());
    assert!(matches!(
        f.store.try_set("bad", &bad, SetOptions::default()),
        Err(StoreError::Serialize { .. })
    ));
    assert!(f.persistent.is_empty());
}

// =============================================================
// Removal and namespacing
// =============================================================

#[test]
fn remove_deletes_from_both_scopes() {
    let f = fixture();
    f.store.set("k", &1, SetOptions::session());
    f.store.set("j", &1, SetOptions::persistent());
    f.store.remove("k");
    f.store.remove("j");
    assert!(f.session.is_empty());
    assert!(f.persistent.is_empty());
}

#[test]
fn keys_are_namespaced_on_the_medium() {
    let f = fixture();
    f.store.set("theme", "dark", SetOptions::default());
    assert_eq!(f.persistent.keys().unwrap(), vec!["site:theme".to_owned()]);
}

#[test]
fn foreign_keys_are_invisible_and_survive_clear() {
    let f = fixture();
    let raw = serde_json::to_string(&StorageEntry::new(json!("x"), 0, None)).unwrap();
    f.persistent.set_item("theme", &raw).unwrap();
    f.persistent.set_item("other:theme", &raw).unwrap();
    f.store.set("theme", "dark", SetOptions::default());

    assert_eq!(f.store.keys_with_prefix(Scope::Persistent, ""), vec!["theme".to_owned()]);
    f.store.clear(Scope::Persistent);
    assert_eq!(f.persistent.keys().unwrap(), vec!["other:theme".to_owned(), "theme".to_owned()]);
}

#[test]
fn two_namespaces_share_a_medium_without_collisions() {
    let medium = MemoryMedium::new();
    let clock = Rc::new(ManualClock::new(0));
    let a_cfg = StoreConfig { namespace: "a:".into(), ..StoreConfig::default() };
    let b_cfg = StoreConfig { namespace: "b:".into(), ..StoreConfig::default() };
    let a = Store::new(Box::new(MemoryMedium::new()), Box::new(medium.clone()), clock.clone(), &a_cfg);
    let b = Store::new(Box::new(MemoryMedium::new()), Box::new(medium.clone()), clock, &b_cfg);

    a.set("k", "from-a", SetOptions::default());
    b.set("k", "from-b", SetOptions::default());
    assert_eq!(a.get::<String>("k").as_deref(), Some("from-a"));
    assert_eq!(b.get::<String>("k").as_deref(), Some("from-b"));
    assert_eq!(medium.len(), 2);
}

#[test]
fn keys_with_prefix_filters() {
    let f = fixture();
    f.store.set("visited:/", &1, SetOptions::default());
    f.store.set("visited:/about", &1, SetOptions::default());
    f.store.set("theme", &1, SetOptions::default());
    assert_eq!(
        f.store.keys_with_prefix(Scope::Persistent, "visited:"),
        vec!["visited:/".to_owned(), "visited:/about".to_owned()]
    );
}

// =============================================================
// Read-through cache
// =============================================================

#[test]
fn cached_produces_once_until_expiry() {
    let config = StoreConfig { cache_ttl_ms: 1_000, ..StoreConfig::default() };
    let f = fixture_with(&config);
    let mut calls = 0;
    let first: Vec<String> = f.store.cached("blog_index", || {
        calls += 1;
        vec!["hello-world".to_owned()]
    });
    let second: Vec<String> = f.store.cached("blog_index", || {
        calls += 1;
        Vec::new()
    });
    assert_eq!(first, second);
    assert_eq!(calls, 1);

    f.clock.advance(1_000);
    let third: Vec<String> = f.store.cached("blog_index", || {
        calls += 1;
        vec!["fresh".to_owned()]
    });
    assert_eq!(third, vec!["fresh".to_owned()]);
    assert_eq!(calls, 2);
}
