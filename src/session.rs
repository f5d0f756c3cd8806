//! Browsing-session identity.
//!
//! A session is whatever the session medium's lifetime is; in the browser
//! that is the tab. The id is minted on first access and lives in the session
//! scope, so it disappears with the tab and never crosses sessions.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::consts::SESSION_KEY;
use crate::scope::Scope;
use crate::store::{SetOptions, Store};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: Uuid,
    /// Milliseconds since the Unix epoch when the session was first seen.
    pub started_at: i64,
}

pub struct Session<'a> {
    store: &'a Store,
}

impl<'a> Session<'a> {
    #[must_use]
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// The current session. The first call mints it and writes it to the
    /// session scope.
    #[must_use]
    pub fn info(&self) -> SessionInfo {
        if let Some(info) = self.store.get_in(SESSION_KEY, Scope::Session) {
            return info;
        }
        let info = SessionInfo { id: Uuid::new_v4(), started_at: self.store.now_ms() };
        self.store.set(SESSION_KEY, &info, SetOptions::session());
        info
    }

    /// Session id, minting the session if needed.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.info().id
    }

    #[must_use]
    pub fn started_at(&self) -> i64 {
        self.info().started_at
    }

    /// The session id if one was already minted; never creates one.
    #[must_use]
    pub fn current_id(&self) -> Option<Uuid> {
        self.store
            .get_in::<SessionInfo>(SESSION_KEY, Scope::Session)
            .map(|info| info.id)
    }
}
