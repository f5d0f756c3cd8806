//! Storage scopes and the consent-gated write decision.
//!
//! DESIGN
//! ======
//! Whether a write may land in the persistent medium is a pure function of
//! the requested scope, the caller's consent flag, and the configured policy.
//! Keeping it free of any medium makes the legal-sensitive branch testable on
//! its own.

#[cfg(test)]
#[path = "scope_test.rs"]
mod scope_test;

use serde::{Deserialize, Serialize};

/// Lifetime of a stored entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Lives until the browsing session (tab) ends.
    Session,
    /// Survives across sessions.
    #[default]
    Persistent,
}

/// What to do with a persistent write that arrives without consent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentPolicy {
    /// Keep the value for this session only.
    #[default]
    DegradeToSession,
    /// Do not store the value at all.
    Drop,
}

/// Resolve where a write actually goes. `None` means skip the write.
#[must_use]
pub fn effective_scope(requested: Scope, consent: bool, policy: ConsentPolicy) -> Option<Scope> {
    match (requested, consent, policy) {
        (Scope::Session, _, _) | (Scope::Persistent, true, _) => Some(requested),
        (Scope::Persistent, false, ConsentPolicy::DegradeToSession) => Some(Scope::Session),
        (Scope::Persistent, false, ConsentPolicy::Drop) => None,
    }
}
