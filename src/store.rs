//! Namespaced, expiring, consent-gated key/value store over two media.
//!
//! ARCHITECTURE
//! ============
//! One [`Store`] owns a session-lifetime medium and a persistent medium. Every
//! value is wrapped in a [`StorageEntry`] and JSON-encoded before it reaches a
//! medium, so media only ever see strings.
//!
//! ERROR HANDLING
//! ==============
//! The store is best-effort. Internal `try_*` helpers return [`StoreError`];
//! the public methods log the error at debug level and degrade to a miss
//! (reads) or a no-op (writes). Nothing here can fail a page render.
//!
//! TRADE-OFFS
//! ==========
//! Expiry is lazy: an expired or unparseable entry is deleted by the read that
//! finds it. There is no sweep, so stale bytes for keys that are never read
//! again stay in the medium until the namespace is cleared.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::clock::Clock;
use crate::config::StoreConfig;
use crate::consts::CACHE_PREFIX;
use crate::entry::StorageEntry;
use crate::error::StoreError;
use crate::medium::Medium;
use crate::scope::{ConsentPolicy, Scope, effective_scope};

/// Per-write options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SetOptions {
    pub scope: Scope,
    /// Lifetime in milliseconds from the time of the write.
    pub expires_in_ms: Option<u64>,
    /// Whether the visitor consented to cross-session storage.
    pub consent: bool,
}

impl Default for SetOptions {
    fn default() -> Self {
        Self { scope: Scope::Persistent, expires_in_ms: None, consent: true }
    }
}

impl SetOptions {
    #[must_use]
    pub fn session() -> Self {
        Self { scope: Scope::Session, ..Self::default() }
    }

    #[must_use]
    pub fn persistent() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn expires_in(mut self, ms: u64) -> Self {
        self.expires_in_ms = Some(ms);
        self
    }

    #[must_use]
    pub fn consent(mut self, consent: bool) -> Self {
        self.consent = consent;
        self
    }
}

pub struct Store {
    session: Box<dyn Medium>,
    persistent: Box<dyn Medium>,
    clock: Rc<dyn Clock>,
    namespace: String,
    consent_policy: ConsentPolicy,
    cache_ttl_ms: u64,
}

impl Store {
    pub fn new(
        session: Box<dyn Medium>,
        persistent: Box<dyn Medium>,
        clock: Rc<dyn Clock>,
        config: &StoreConfig,
    ) -> Self {
        Self {
            session,
            persistent,
            clock,
            namespace: config.namespace.clone(),
            consent_policy: config.consent_policy,
            cache_ttl_ms: config.cache_ttl_ms,
        }
    }

    /// Current time according to the store's clock.
    #[must_use]
    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    // --- Reads ---

    /// Read `key`, checking the session scope first and then persistent.
    #[must_use]
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get_in(key, Scope::Session)
            .or_else(|| self.get_in(key, Scope::Persistent))
    }

    /// Read `key` from one scope. Expired, corrupt, or mistyped entries are
    /// removed and read as `None`.
    #[must_use]
    pub fn get_in<T: DeserializeOwned>(&self, key: &str, scope: Scope) -> Option<T> {
        let entry = self.entry_in(key, scope)?;
        match serde_json::from_value(entry.value) {
            Ok(value) => Some(value),
            Err(err) => {
                let err = StoreError::CorruptEntry { key: self.full_key(key), reason: err.to_string() };
                log::debug!("store read miss: {err}");
                self.remove_in(key, scope);
                None
            }
        }
    }

    /// The live entry for `key` in `scope`, including its timestamps.
    #[must_use]
    pub fn entry_in(&self, key: &str, scope: Scope) -> Option<StorageEntry> {
        match self.try_entry(key, scope) {
            Ok(entry) => entry,
            Err(err) => {
                log::debug!("store read miss: {err}");
                None
            }
        }
    }

    /// Whether a live entry exists for `key` in `scope`.
    #[must_use]
    pub fn contains(&self, key: &str, scope: Scope) -> bool {
        self.entry_in(key, scope).is_some()
    }

    /// The raw medium string for `key`, without decoding or eviction.
    #[must_use]
    pub fn probe_raw(&self, key: &str, scope: Scope) -> Option<String> {
        self.medium(scope)
            .get_item(&self.full_key(key))
            .unwrap_or_default()
    }

    /// Un-namespaced keys in `scope` that start with `prefix`.
    #[must_use]
    pub fn keys_with_prefix(&self, scope: Scope, prefix: &str) -> Vec<String> {
        let keys = match self.medium(scope).keys() {
            Ok(keys) => keys,
            Err(err) => {
                log::debug!("store key listing failed: {err}");
                return Vec::new();
            }
        };
        keys.into_iter()
            .filter_map(|k| k.strip_prefix(self.namespace.as_str()).map(str::to_owned))
            .filter(|k| k.starts_with(prefix))
            .collect()
    }

    // --- Writes ---

    /// Write `value` at `key`. Failures are logged and ignored.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, options: SetOptions) {
        if let Err(err) = self.try_set(key, value, options) {
            log::debug!("store write skipped: {err}");
        }
    }

    /// Remove `key` from both scopes.
    pub fn remove(&self, key: &str) {
        self.remove_in(key, Scope::Session);
        self.remove_in(key, Scope::Persistent);
    }

    /// Remove `key` from one scope.
    pub fn remove_in(&self, key: &str, scope: Scope) {
        let full = self.full_key(key);
        if let Err(err) = self.medium(scope).remove_item(&full) {
            log::debug!("store remove failed: {}", StoreError::from_medium(&full, err));
        }
    }

    /// Remove every namespaced key from `scope`. Keys owned by other code
    /// sharing the medium are left alone.
    pub fn clear(&self, scope: Scope) {
        for key in self.keys_with_prefix(scope, "") {
            self.remove_in(&key, scope);
        }
    }

    /// Read-through cache: return the live cached value for `key`, or produce,
    /// store for the configured cache window, and return a fresh one.
    pub fn cached<T, F>(&self, key: &str, produce: F) -> T
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> T,
    {
        let cache_key = format!("{CACHE_PREFIX}{key}");
        if let Some(hit) = self.get_in(&cache_key, Scope::Persistent) {
            return hit;
        }
        let fresh = produce();
        self.set(&cache_key, &fresh, SetOptions::persistent().expires_in(self.cache_ttl_ms));
        fresh
    }

    // --- Internals ---

    /// Write and report where the value landed.
    pub(crate) fn try_set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        options: SetOptions,
    ) -> Result<Scope, StoreError> {
        let full = self.full_key(key);
        let value = serde_json::to_value(value).map_err(|source| StoreError::Serialize { key: full.clone(), source })?;
        let scope = effective_scope(options.scope, options.consent, self.consent_policy)
            .ok_or_else(|| StoreError::ConsentDenied { key: full.clone() })?;

        let entry = StorageEntry::new(value, self.now_ms(), options.expires_in_ms);
        let raw = serde_json::to_string(&entry).map_err(|source| StoreError::Serialize { key: full.clone(), source })?;
        self.medium(scope)
            .set_item(&full, &raw)
            .map_err(|err| StoreError::from_medium(&full, err))?;

        // A persistent write supersedes any session copy left by an earlier
        // consent-degraded write, which `get` would otherwise read first.
        if scope == Scope::Persistent {
            self.remove_in(key, Scope::Session);
        }
        Ok(scope)
    }

    fn try_entry(&self, key: &str, scope: Scope) -> Result<Option<StorageEntry>, StoreError> {
        let full = self.full_key(key);
        let medium = self.medium(scope);
        let Some(raw) = medium
            .get_item(&full)
            .map_err(|err| StoreError::from_medium(&full, err))?
        else {
            return Ok(None);
        };

        let entry: StorageEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(err) => {
                self.remove_in(key, scope);
                return Err(StoreError::CorruptEntry { key: full, reason: err.to_string() });
            }
        };

        if entry.is_expired(self.now_ms()) {
            self.remove_in(key, scope);
            return Ok(None);
        }
        Ok(Some(entry))
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{key}", self.namespace)
    }

    fn medium(&self, scope: Scope) -> &dyn Medium {
        match scope {
            Scope::Session => self.session.as_ref(),
            Scope::Persistent => self.persistent.as_ref(),
        }
    }
}
