//! Backing media: the string key/value facilities behind each scope.
//!
//! SYSTEM CONTEXT
//! ==============
//! The store does all JSON encoding, expiry, and namespacing itself; a medium
//! only has to preserve `String -> String` semantics. In the browser that is
//! `localStorage`/`sessionStorage` (see `web`); natively and in tests it is
//! [`MemoryMedium`].

#[cfg(test)]
#[path = "medium_test.rs"]
mod medium_test;

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

/// Failure reported by a medium.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MediumError {
    /// The write would exceed the medium's capacity.
    #[error("storage quota exceeded")]
    QuotaExceeded,
    /// The medium is disabled or the host refused the call.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl MediumError {
    /// Classify a host storage exception by its rendered message.
    #[must_use]
    pub fn from_host_message(message: &str) -> Self {
        let lower = message.to_ascii_lowercase();
        if lower.contains("quotaexceeded") || lower.contains("quota_exceeded") || lower.contains("quota exceeded") {
            Self::QuotaExceeded
        } else {
            Self::Unavailable(message.to_owned())
        }
    }
}

/// A string key/value store with `Storage`-like semantics.
pub trait Medium {
    /// Read the raw value stored at `key`.
    fn get_item(&self, key: &str) -> Result<Option<String>, MediumError>;
    /// Write `value` at `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> Result<(), MediumError>;
    /// Delete `key`. Deleting a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<(), MediumError>;
    /// Every key currently held by the medium.
    fn keys(&self) -> Result<Vec<String>, MediumError>;
}

/// In-memory medium.
///
/// Clones share the same underlying map, so two stores built from clones of
/// one `MemoryMedium` see each other's writes. Tests use this to simulate a
/// new browser session: fresh session medium, same persistent medium.
#[derive(Clone, Debug, Default)]
pub struct MemoryMedium {
    items: Rc<RefCell<BTreeMap<String, String>>>,
    quota_bytes: Option<usize>,
    disabled: Rc<Cell<bool>>,
}

impl MemoryMedium {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A medium that rejects writes once keys plus values exceed `bytes`.
    #[must_use]
    pub fn with_quota(bytes: usize) -> Self {
        Self { quota_bytes: Some(bytes), ..Self::default() }
    }

    /// Make every call fail as if storage were disabled (private browsing).
    pub fn set_disabled(&self, disabled: bool) {
        self.disabled.set(disabled);
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    fn check_enabled(&self) -> Result<(), MediumError> {
        if self.disabled.get() {
            return Err(MediumError::Unavailable("storage disabled".to_owned()));
        }
        Ok(())
    }
}

impl Medium for MemoryMedium {
    fn get_item(&self, key: &str) -> Result<Option<String>, MediumError> {
        self.check_enabled()?;
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), MediumError> {
        self.check_enabled()?;
        let mut items = self.items.borrow_mut();
        if let Some(quota) = self.quota_bytes {
            let used: usize = items
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            if used + key.len() + value.len() > quota {
                return Err(MediumError::QuotaExceeded);
            }
        }
        items.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), MediumError> {
        self.check_enabled()?;
        self.items.borrow_mut().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, MediumError> {
        self.check_enabled()?;
        Ok(self.items.borrow().keys().cloned().collect())
    }
}
