//! Store configuration: expiration windows, limits, and endpoints.
//!
//! Every window is a constant in `consts` that deployments can override,
//! either from a JSON blob embedded in the page ([`StoreConfig::from_json`])
//! or from `SITESTORE_*` environment variables for native builds
//! ([`StoreConfig::from_env`]).

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_CACHE_TTL_MS, DEFAULT_FORM_DRAFT_TTL_MS, DEFAULT_JOURNEY_LIMIT, DEFAULT_NAMESPACE,
    DEFAULT_PACKAGE_INTEREST_TTL_MS, DEFAULT_TELEMETRY_BATCH_SIZE, DEFAULT_TELEMETRY_BUFFER_LIMIT,
};
use crate::scope::ConsentPolicy;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(String),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("config json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Prefix applied to every key written into a medium.
    pub namespace: String,
    pub consent_policy: ConsentPolicy,
    pub form_draft_ttl_ms: u64,
    pub package_interest_ttl_ms: u64,
    pub cache_ttl_ms: u64,
    pub journey_limit: usize,
    pub telemetry_buffer_limit: usize,
    pub telemetry_batch_size: usize,
    /// Analytics collector for the beacon transport, if any.
    pub telemetry_endpoint: Option<String>,
    /// Form relay URL contact submissions are posted to.
    pub contact_endpoint: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_owned(),
            consent_policy: ConsentPolicy::DegradeToSession,
            form_draft_ttl_ms: DEFAULT_FORM_DRAFT_TTL_MS,
            package_interest_ttl_ms: DEFAULT_PACKAGE_INTEREST_TTL_MS,
            cache_ttl_ms: DEFAULT_CACHE_TTL_MS,
            journey_limit: DEFAULT_JOURNEY_LIMIT,
            telemetry_buffer_limit: DEFAULT_TELEMETRY_BUFFER_LIMIT,
            telemetry_batch_size: DEFAULT_TELEMETRY_BATCH_SIZE,
            telemetry_endpoint: None,
            contact_endpoint: None,
        }
    }
}

impl StoreConfig {
    /// Parse a JSON object; absent fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] for malformed JSON and
    /// [`ConfigError::Invalid`] when a limit is zero or the namespace is empty.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validated()
    }

    /// Build config from environment variables.
    ///
    /// Optional:
    /// - `SITESTORE_NAMESPACE`: default `site:`
    /// - `SITESTORE_CONSENT_POLICY`: `degrade` (default) or `drop`
    /// - `SITESTORE_FORM_DRAFT_TTL_MS`: default 24h
    /// - `SITESTORE_PACKAGE_INTEREST_TTL_MS`: default 1h
    /// - `SITESTORE_CACHE_TTL_MS`: default 1h
    /// - `SITESTORE_JOURNEY_LIMIT`: default 50
    /// - `SITESTORE_TELEMETRY_BUFFER_LIMIT`: default 100
    /// - `SITESTORE_TELEMETRY_BATCH_SIZE`: default 10
    /// - `SITESTORE_TELEMETRY_ENDPOINT`, `SITESTORE_CONTACT_ENDPOINT`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for an unknown consent policy and
    /// [`ConfigError::Invalid`] when a limit is zero or the namespace is empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key))
    }

    /// Build config from any variable lookup; `from_env` uses the process env.
    ///
    /// # Errors
    ///
    /// See [`StoreConfig::from_env`].
    pub fn from_vars<F, E>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, E>,
    {
        let defaults = Self::default();
        let consent_policy = match lookup("SITESTORE_CONSENT_POLICY") {
            Ok(raw) => parse_consent_policy(&raw)?,
            Err(_) => defaults.consent_policy,
        };
        let config = Self {
            namespace: lookup("SITESTORE_NAMESPACE").unwrap_or(defaults.namespace),
            consent_policy,
            form_draft_ttl_ms: env_parse(&lookup, "SITESTORE_FORM_DRAFT_TTL_MS", defaults.form_draft_ttl_ms),
            package_interest_ttl_ms: env_parse(
                &lookup,
                "SITESTORE_PACKAGE_INTEREST_TTL_MS",
                defaults.package_interest_ttl_ms,
            ),
            cache_ttl_ms: env_parse(&lookup, "SITESTORE_CACHE_TTL_MS", defaults.cache_ttl_ms),
            journey_limit: env_parse(&lookup, "SITESTORE_JOURNEY_LIMIT", defaults.journey_limit),
            telemetry_buffer_limit: env_parse(
                &lookup,
                "SITESTORE_TELEMETRY_BUFFER_LIMIT",
                defaults.telemetry_buffer_limit,
            ),
            telemetry_batch_size: env_parse(&lookup, "SITESTORE_TELEMETRY_BATCH_SIZE", defaults.telemetry_batch_size),
            telemetry_endpoint: env_string(&lookup, "SITESTORE_TELEMETRY_ENDPOINT"),
            contact_endpoint: env_string(&lookup, "SITESTORE_CONTACT_ENDPOINT"),
        };
        config.validated()
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if self.namespace.is_empty() {
            return Err(ConfigError::Invalid("namespace must not be empty".into()));
        }
        if self.journey_limit == 0 {
            return Err(ConfigError::Invalid("journey_limit must be at least 1".into()));
        }
        if self.telemetry_batch_size == 0 {
            return Err(ConfigError::Invalid("telemetry_batch_size must be at least 1".into()));
        }
        if self.telemetry_buffer_limit < self.telemetry_batch_size {
            return Err(ConfigError::Invalid(format!(
                "telemetry_buffer_limit ({}) must be >= telemetry_batch_size ({})",
                self.telemetry_buffer_limit, self.telemetry_batch_size
            )));
        }
        Ok(self)
    }
}

fn env_parse<F, E, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Result<String, E>,
    T: std::str::FromStr + Copy,
{
    match lookup(key) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or_else(|_| {
            log::warn!("ignoring unparseable {key}={raw:?}; using default");
            default
        }),
        Err(_) => default,
    }
}

fn env_string<F, E>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Result<String, E>,
{
    match lookup(key) {
        Ok(raw) if !raw.trim().is_empty() => Some(raw.trim().to_owned()),
        _ => None,
    }
}

fn parse_consent_policy(raw: &str) -> Result<ConsentPolicy, ConfigError> {
    match raw.trim() {
        "degrade" | "degrade_to_session" => Ok(ConsentPolicy::DegradeToSession),
        "drop" => Ok(ConsentPolicy::Drop),
        other => Err(ConfigError::Parse(format!(
            "unknown SITESTORE_CONSENT_POLICY '{other}' (expected 'degrade' or 'drop')"
        ))),
    }
}
