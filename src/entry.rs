//! The envelope every stored value is wrapped in.

#[cfg(test)]
#[path = "entry_test.rs"]
mod entry_test;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A value plus its bookkeeping, serialized as the raw medium string.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StorageEntry {
    pub value: Value,
    /// Milliseconds since the Unix epoch when the entry was written.
    pub created_at: i64,
    /// Absolute expiry; `None` lives for the scope's natural lifetime.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl StorageEntry {
    #[must_use]
    pub fn new(value: Value, now_ms: i64, expires_in_ms: Option<u64>) -> Self {
        let expires_at = expires_in_ms.map(|ms| now_ms.saturating_add(i64::try_from(ms).unwrap_or(i64::MAX)));
        Self { value, created_at: now_ms, expires_at }
    }

    /// Expired entries are treated as absent from the instant they expire.
    #[must_use]
    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.expires_at.is_some_and(|at| now_ms >= at)
    }
}
