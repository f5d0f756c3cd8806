//! Client-side storage and personalization for the marketing site.
//!
//! This crate compiles natively (tests, SSR) and to WebAssembly for the
//! browser (`hydrate` feature). Page components hold a [`context::SiteContext`]
//! and never touch `localStorage`/`sessionStorage` themselves. Everything
//! here is best-effort: storage, consent, and transport failures degrade to
//! misses and no-ops, never to a failed render.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`context`] | The context object built once at startup; hands out views |
//! | [`store`] | Namespaced, expiring, consent-gated key/value store |
//! | [`medium`] | `Medium` trait and the in-memory medium |
//! | `web` | `localStorage`/`sessionStorage` media (hydrate only) |
//! | [`scope`] | Session vs persistent scope and the consent decision |
//! | [`entry`] | Stored-value envelope with expiry |
//! | [`forms`] | Form draft save/load/clear |
//! | [`session`] | Per-tab session identity |
//! | [`journey`] | Page journey, returning-visitor and first-seen markers |
//! | [`intent`] | Lead intent by vertical and the package-interest handoff |
//! | [`preferences`] | Theme, reduced motion, analytics consent |
//! | [`telemetry`] | Event buffer, transports, `track`/`time` |
//! | [`idle`] | Deferral to `requestIdleCallback` |
//! | [`contact`] | Contact form prefill and relay payload |
//! | [`config`] | Expiration windows, limits, endpoints |
//! | [`clock`] | Wall-clock source |
//! | [`consts`] | Defaults and storage keys |

pub mod clock;
pub mod config;
pub mod consts;
pub mod contact;
pub mod context;
pub mod entry;
pub mod error;
pub mod forms;
pub mod idle;
pub mod intent;
pub mod journey;
pub mod medium;
pub mod preferences;
pub mod scope;
pub mod session;
pub mod store;
pub mod telemetry;
#[cfg(feature = "hydrate")]
pub mod web;

pub use config::StoreConfig;
pub use context::SiteContext;
pub use scope::Scope;
pub use store::{SetOptions, Store};

/// Route `log` output to the browser console and install the panic hook.
/// Safe to call more than once.
#[cfg(feature = "hydrate")]
pub fn init_browser_logging(level: log::Level) {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(level).is_err() {
        log::debug!("logger already installed");
    }
}
