//! Browser media: `window.localStorage` and `window.sessionStorage`.
//!
//! SYSTEM CONTEXT
//! ==============
//! Hydrate-only. Either storage may be missing or throw (private browsing,
//! storage disabled by policy, sandboxed iframes); a missing storage becomes a
//! medium whose every call reports `Unavailable`, which the store turns into
//! misses and no-ops.

use crate::medium::{Medium, MediumError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WebStorageKind {
    Local,
    Session,
}

#[derive(Clone, Debug)]
pub struct WebMedium {
    kind: WebStorageKind,
    storage: Option<web_sys::Storage>,
}

impl WebMedium {
    /// Cross-session storage backed by `localStorage`.
    #[must_use]
    pub fn local() -> Self {
        let storage = web_sys::window().and_then(|w| w.local_storage().unwrap_or_default());
        Self { kind: WebStorageKind::Local, storage }
    }

    /// Tab-lifetime storage backed by `sessionStorage`.
    #[must_use]
    pub fn session() -> Self {
        let storage = web_sys::window().and_then(|w| w.session_storage().unwrap_or_default());
        Self { kind: WebStorageKind::Session, storage }
    }

    fn storage(&self) -> Result<&web_sys::Storage, MediumError> {
        self.storage
            .as_ref()
            .ok_or_else(|| MediumError::Unavailable(format!("{:?} storage not available", self.kind)))
    }
}

fn host_error(err: &wasm_bindgen::JsValue) -> MediumError {
    MediumError::from_host_message(&format!("{err:?}"))
}

impl Medium for WebMedium {
    fn get_item(&self, key: &str) -> Result<Option<String>, MediumError> {
        self.storage()?.get_item(key).map_err(|e| host_error(&e))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), MediumError> {
        self.storage()?.set_item(key, value).map_err(|e| host_error(&e))
    }

    fn remove_item(&self, key: &str) -> Result<(), MediumError> {
        self.storage()?.remove_item(key).map_err(|e| host_error(&e))
    }

    fn keys(&self) -> Result<Vec<String>, MediumError> {
        let storage = self.storage()?;
        let len = storage.length().map_err(|e| host_error(&e))?;
        let mut keys = Vec::with_capacity(len as usize);
        for index in 0..len {
            if let Some(key) = storage.key(index).map_err(|e| host_error(&e))? {
                keys.push(key);
            }
        }
        Ok(keys)
    }
}
