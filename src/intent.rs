//! Lead intent (business verticals) and the package-interest handoff.
//!
//! Lead intent accumulates for the life of the persistent store and drives
//! call-to-action personalization. Package interest is a single value passed
//! from the services page to the contact form, which applies it once and
//! clears it so a later unrelated visit does not re-apply stale interest.

#[cfg(test)]
#[path = "intent_test.rs"]
mod intent_test;

use serde::{Deserialize, Serialize};

use crate::consts::{LEAD_INTENT_KEY, PACKAGE_INTEREST_KEY};
use crate::scope::Scope;
use crate::store::{SetOptions, Store};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadIntentRecord {
    pub vertical: String,
    pub first_marked_at: i64,
    pub last_marked_at: i64,
    pub marks: u32,
}

pub struct LeadIntent<'a> {
    store: &'a Store,
}

impl<'a> LeadIntent<'a> {
    #[must_use]
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Record interest in `vertical`. Repeat marks keep `first_marked_at`.
    pub fn mark_interest(&self, vertical: &str) {
        self.mark_interest_with_consent(vertical, true);
    }

    /// Record interest with an explicit consent flag. Without consent the
    /// mark stays out of the persistent scope, and a later consented mark
    /// only extends what was already persisted.
    pub fn mark_interest_with_consent(&self, vertical: &str, consent: bool) {
        let vertical = normalize_vertical(vertical);
        if vertical.is_empty() {
            return;
        }
        let now = self.store.now_ms();
        if !consent {
            let mut records = self.records();
            apply_mark(&mut records, &vertical, now);
            self.store.set(LEAD_INTENT_KEY, &records, SetOptions::persistent().consent(false));
            return;
        }

        let shadow: Option<Vec<LeadIntentRecord>> = self.store.get_in(LEAD_INTENT_KEY, Scope::Session);
        let mut persisted: Vec<LeadIntentRecord> =
            self.store.get_in(LEAD_INTENT_KEY, Scope::Persistent).unwrap_or_default();
        apply_mark(&mut persisted, &vertical, now);
        self.store.set(LEAD_INTENT_KEY, &persisted, SetOptions::persistent());

        // The persistent write drops the session copy; put back the
        // unconsented records so this session still sees them.
        if let Some(mut shadow) = shadow {
            apply_mark(&mut shadow, &vertical, now);
            self.store.set(LEAD_INTENT_KEY, &shadow, SetOptions::session());
        }
    }

    #[must_use]
    pub fn get(&self, vertical: &str) -> Option<LeadIntentRecord> {
        let vertical = normalize_vertical(vertical);
        self.records().into_iter().find(|r| r.vertical == vertical)
    }

    #[must_use]
    pub fn has_interest(&self, vertical: &str) -> bool {
        self.get(vertical).is_some()
    }

    /// Every vertical marked so far, in first-marked order.
    #[must_use]
    pub fn verticals(&self) -> Vec<String> {
        self.records().into_iter().map(|r| r.vertical).collect()
    }

    /// The most recently marked vertical; on a tie, the later record.
    #[must_use]
    pub fn primary_vertical(&self) -> Option<String> {
        self.records()
            .into_iter()
            .max_by_key(|r| r.last_marked_at)
            .map(|r| r.vertical)
    }

    /// All records, in first-marked order.
    #[must_use]
    pub fn records(&self) -> Vec<LeadIntentRecord> {
        self.store.get(LEAD_INTENT_KEY).unwrap_or_default()
    }
}

fn apply_mark(records: &mut Vec<LeadIntentRecord>, vertical: &str, now: i64) {
    match records.iter_mut().find(|r| r.vertical == vertical) {
        Some(record) => {
            record.last_marked_at = now;
            record.marks = record.marks.saturating_add(1);
        }
        None => records.push(LeadIntentRecord {
            vertical: vertical.to_owned(),
            first_marked_at: now,
            last_marked_at: now,
            marks: 1,
        }),
    }
}

fn normalize_vertical(vertical: &str) -> String {
    vertical.trim().to_lowercase()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct PackageInterestRecord {
    package_name: String,
    set_at: i64,
}

pub struct PackageInterest<'a> {
    store: &'a Store,
    ttl_ms: u64,
}

impl<'a> PackageInterest<'a> {
    #[must_use]
    pub fn new(store: &'a Store, ttl_ms: u64) -> Self {
        Self { store, ttl_ms }
    }

    /// Replace the current package of interest.
    pub fn set(&self, package_name: &str) {
        let package_name = package_name.trim();
        if package_name.is_empty() {
            self.clear();
            return;
        }
        let record = PackageInterestRecord { package_name: package_name.to_owned(), set_at: self.store.now_ms() };
        self.store.set(
            PACKAGE_INTEREST_KEY,
            &record,
            SetOptions::persistent().expires_in(self.ttl_ms),
        );
    }

    /// The current package, without consuming it.
    #[must_use]
    pub fn get(&self) -> Option<String> {
        self.store
            .get::<PackageInterestRecord>(PACKAGE_INTEREST_KEY)
            .map(|r| r.package_name)
    }

    pub fn clear(&self) {
        self.store.remove(PACKAGE_INTEREST_KEY);
    }

    /// Read and clear in one step, for the destination form.
    pub fn take(&self) -> Option<String> {
        let package = self.get();
        if package.is_some() {
            self.clear();
        }
        package
    }
}
