//! Error taxonomy for the storage layer.
//!
//! ERROR HANDLING
//! ==============
//! These errors never reach a page. Internal `try_*` helpers return them so
//! tests can assert on the failure mode, and the public contracts log them at
//! debug level and degrade to a miss or a no-op.

use crate::medium::MediumError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing medium is disabled, missing, or rejected the call.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    /// The medium refused a write because it is full.
    #[error("storage quota exceeded for key {key}")]
    QuotaExceeded { key: String },
    /// A stored value could not be parsed back into the requested shape.
    #[error("corrupt entry at {key}: {reason}")]
    CorruptEntry { key: String, reason: String },
    /// A persistent write was requested without consent and the policy drops it.
    #[error("persistent write to {key} skipped: consent not granted")]
    ConsentDenied { key: String },
    /// The caller's value could not be encoded as JSON.
    #[error("failed to serialize value for {key}: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub(crate) fn from_medium(key: &str, err: MediumError) -> Self {
        match err {
            MediumError::QuotaExceeded => Self::QuotaExceeded { key: key.to_owned() },
            MediumError::Unavailable(reason) => Self::StorageUnavailable(reason),
        }
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;
