//! Visitor-chosen settings: theme, motion, and analytics consent.
//!
//! Theme resolution follows the usual order: an explicit choice wins, and
//! `Theme::System` defers to the `prefers-color-scheme` media query result
//! the caller passes in.

#[cfg(test)]
#[path = "preferences_test.rs"]
mod preferences_test;

use serde::{Deserialize, Serialize};

use crate::consts::PREFERENCES_KEY;
use crate::store::{SetOptions, Store};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPreferences {
    pub theme: Theme,
    /// Explicit reduced-motion override; `None` follows the OS setting.
    pub reduced_motion: Option<bool>,
    /// The visitor's answer to the analytics prompt; `None` until asked.
    pub analytics_consent: Option<bool>,
}

impl UserPreferences {
    #[must_use]
    pub fn prefers_dark(&self, system_prefers_dark: bool) -> bool {
        match self.theme {
            Theme::Light => false,
            Theme::Dark => true,
            Theme::System => system_prefers_dark,
        }
    }

    /// Analytics run unless the visitor explicitly declined.
    #[must_use]
    pub fn analytics_allowed(&self) -> bool {
        self.analytics_consent != Some(false)
    }

    /// The visitor explicitly agreed. Required before anything about the
    /// visit is kept across sessions.
    #[must_use]
    pub fn analytics_granted(&self) -> bool {
        self.analytics_consent == Some(true)
    }
}

pub struct Preferences<'a> {
    store: &'a Store,
}

impl<'a> Preferences<'a> {
    #[must_use]
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Stored preferences, or defaults when none are stored.
    #[must_use]
    pub fn load(&self) -> UserPreferences {
        self.store.get(PREFERENCES_KEY).unwrap_or_default()
    }

    pub fn save(&self, prefs: &UserPreferences) {
        self.store.set(PREFERENCES_KEY, prefs, SetOptions::persistent());
    }

    /// Load, modify, save, and return the result.
    pub fn update<F>(&self, f: F) -> UserPreferences
    where
        F: FnOnce(&mut UserPreferences),
    {
        let mut prefs = self.load();
        f(&mut prefs);
        self.save(&prefs);
        prefs
    }

    /// Flip dark mode relative to what is showing now and pin the choice.
    pub fn toggle_dark(&self, system_prefers_dark: bool) -> bool {
        let next = !self.load().prefers_dark(system_prefers_dark);
        self.update(|prefs| prefs.theme = if next { Theme::Dark } else { Theme::Light });
        next
    }
}
