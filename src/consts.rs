//! Shared constants: default expiration windows, limits, and storage keys.

// ── Expiration windows (milliseconds) ───────────────────────────

/// How long an untouched form draft survives before it stops resurfacing.
pub const DEFAULT_FORM_DRAFT_TTL_MS: u64 = 24 * 60 * 60 * 1000;

/// How long a package-interest handoff stays valid.
pub const DEFAULT_PACKAGE_INTEREST_TTL_MS: u64 = 60 * 60 * 1000;

/// Default lifetime for read-through cached content (blog index, etc.).
pub const DEFAULT_CACHE_TTL_MS: u64 = 60 * 60 * 1000;

// ── Limits ──────────────────────────────────────────────────────

/// Maximum journey entries kept per session; oldest are dropped first.
pub const DEFAULT_JOURNEY_LIMIT: usize = 50;

/// Maximum buffered telemetry events; oldest are dropped first.
pub const DEFAULT_TELEMETRY_BUFFER_LIMIT: usize = 100;

/// Buffered events that trigger a forward to the transport.
pub const DEFAULT_TELEMETRY_BATCH_SIZE: usize = 10;

// ── Keys ────────────────────────────────────────────────────────

/// Prefix applied to every key this crate writes into a medium.
pub const DEFAULT_NAMESPACE: &str = "site:";

pub const SESSION_KEY: &str = "session";
pub const JOURNEY_KEY: &str = "journey";
pub const VISIT_MARKER_PREFIX: &str = "visited:";
pub const FORM_DRAFT_PREFIX: &str = "form:";
pub const LEAD_INTENT_KEY: &str = "lead_intent";
pub const PACKAGE_INTEREST_KEY: &str = "package_interest";
pub const PREFERENCES_KEY: &str = "preferences";
pub const CACHE_PREFIX: &str = "cache:";
