//! In-progress form drafts.
//!
//! The component layer debounces keystrokes and calls [`FormDrafts::save`];
//! this module writes immediately. Drafts expire after the configured window
//! so an abandoned form does not resurface indefinitely, and must be cleared
//! after a successful submission.

#[cfg(test)]
#[path = "forms_test.rs"]
mod forms_test;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::consts::FORM_DRAFT_PREFIX;
use crate::scope::Scope;
use crate::store::{SetOptions, Store};

pub type FormFields = BTreeMap<String, String>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormDraft {
    pub form_id: String,
    pub fields: FormFields,
    pub saved_at: i64,
}

pub struct FormDrafts<'a> {
    store: &'a Store,
    ttl_ms: u64,
}

impl<'a> FormDrafts<'a> {
    #[must_use]
    pub fn new(store: &'a Store, ttl_ms: u64) -> Self {
        Self { store, ttl_ms }
    }

    /// Overwrite the draft for `form_id`. A draft with no non-blank values is
    /// cleared rather than stored.
    pub fn save(&self, form_id: &str, fields: &FormFields) {
        if fields.values().all(|v| v.trim().is_empty()) {
            self.clear(form_id);
            return;
        }
        let draft = FormDraft {
            form_id: form_id.to_owned(),
            fields: fields.clone(),
            saved_at: self.store.now_ms(),
        };
        self.store.set(
            &draft_key(form_id),
            &draft,
            SetOptions::persistent().expires_in(self.ttl_ms),
        );
    }

    /// The most recent field set, if a live draft exists.
    #[must_use]
    pub fn load(&self, form_id: &str) -> Option<FormFields> {
        self.draft(form_id).map(|draft| draft.fields)
    }

    /// When the live draft was last saved.
    #[must_use]
    pub fn saved_at(&self, form_id: &str) -> Option<i64> {
        self.draft(form_id).map(|draft| draft.saved_at)
    }

    pub fn clear(&self, form_id: &str) {
        self.store.remove(&draft_key(form_id));
    }

    fn draft(&self, form_id: &str) -> Option<FormDraft> {
        self.store
            .get_in::<FormDraft>(&draft_key(form_id), Scope::Persistent)
            .filter(|draft| draft.form_id == form_id)
    }
}

fn draft_key(form_id: &str) -> String {
    format!("{FORM_DRAFT_PREFIX}{form_id}")
}
