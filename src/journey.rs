//! Page-visit tracking: the current session's journey and cross-session
//! first-seen markers.
//!
//! DESIGN
//! ======
//! Two records back this module:
//! - the journey, an ordered list in the session scope that dies with the tab;
//! - one persistent `visited:<path>` marker per path, written once with the
//!   first-seen time and never overwritten.
//!
//! Returning-visitor status reads only the markers, so it survives a new
//! session while the journey starts empty.

#[cfg(test)]
#[path = "journey_test.rs"]
mod journey_test;

use serde::{Deserialize, Serialize};

use crate::consts::{JOURNEY_KEY, VISIT_MARKER_PREFIX};
use crate::scope::Scope;
use crate::store::{SetOptions, Store};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JourneyEntry {
    pub path: String,
    /// Milliseconds since the Unix epoch when the page was entered.
    pub timestamp: i64,
}

pub struct JourneyTracker<'a> {
    store: &'a Store,
    limit: usize,
}

impl<'a> JourneyTracker<'a> {
    #[must_use]
    pub fn new(store: &'a Store, limit: usize) -> Self {
        Self { store, limit: limit.max(1) }
    }

    /// Record a page view with consent for the persistent marker.
    pub fn mark_visited(&self, path: &str) {
        self.mark_visited_with_consent(path, true);
    }

    /// Record a page view. Re-marking the page the visitor is already on does
    /// not add a journey entry.
    pub fn mark_visited_with_consent(&self, path: &str, consent: bool) {
        let path = normalize_path(path);
        let now = self.store.now_ms();

        let mut journey = self.get_journey();
        if journey.last().is_none_or(|last| last.path != path) {
            journey.push(JourneyEntry { path: path.clone(), timestamp: now });
            if journey.len() > self.limit {
                let excess = journey.len() - self.limit;
                journey.drain(..excess);
            }
            self.store.set(JOURNEY_KEY, &journey, SetOptions::session());
        }

        let marker = marker_key(&path);
        if !consent {
            if self.store.get::<i64>(&marker).is_none() {
                self.store.set(&marker, &now, SetOptions::persistent().consent(false));
            }
            return;
        }
        if self.store.get_in::<i64>(&marker, Scope::Persistent).is_none() {
            // Promote a marker left by an unconsented visit, keeping its time.
            let first_seen = self.store.get_in::<i64>(&marker, Scope::Session).unwrap_or(now);
            self.store.set(&marker, &first_seen, SetOptions::persistent());
        }
    }

    /// True once any page has ever been marked in the persistent scope.
    #[must_use]
    pub fn is_returning_user(&self) -> bool {
        !self
            .store
            .keys_with_prefix(Scope::Persistent, VISIT_MARKER_PREFIX)
            .is_empty()
    }

    /// Whether `path` was seen in this or any earlier session.
    #[must_use]
    pub fn has_visited(&self, path: &str) -> bool {
        self.first_seen(path).is_some() || self.has_visited_this_session(path)
    }

    #[must_use]
    pub fn has_visited_this_session(&self, path: &str) -> bool {
        let path = normalize_path(path);
        self.get_journey().iter().any(|entry| entry.path == path)
    }

    /// When `path` was first ever marked.
    #[must_use]
    pub fn first_seen(&self, path: &str) -> Option<i64> {
        self.store.get(&marker_key(&normalize_path(path)))
    }

    /// This session's page views in arrival order. Read-only.
    #[must_use]
    pub fn get_journey(&self) -> Vec<JourneyEntry> {
        self.store
            .get_in(JOURNEY_KEY, Scope::Session)
            .unwrap_or_default()
    }

    /// The page before the current one, if the session has one.
    #[must_use]
    pub fn get_previous_page(&self) -> Option<JourneyEntry> {
        let mut journey = self.get_journey();
        let len = journey.len();
        if len < 2 {
            return None;
        }
        Some(journey.swap_remove(len - 2))
    }

    /// The first page of this session.
    #[must_use]
    pub fn landing_page(&self) -> Option<JourneyEntry> {
        self.get_journey().into_iter().next()
    }

    /// True until a second distinct page is recorded in this session.
    #[must_use]
    pub fn is_new_session(&self) -> bool {
        self.get_journey().len() <= 1
    }
}

fn marker_key(path: &str) -> String {
    format!("{VISIT_MARKER_PREFIX}{path}")
}

/// Canonical form of a page path: no query or fragment, no trailing slash
/// except the root.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let path = path.trim();
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_owned();
    }
    if trimmed.starts_with('/') {
        trimmed.to_owned()
    } else {
        format!("/{trimmed}")
    }
}
