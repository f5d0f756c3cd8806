//! Lightweight performance and interaction telemetry.
//!
//! ARCHITECTURE
//! ============
//! Call sites invoke [`PerformanceTracker::track`] from an idle callback (see
//! `idle`). Recording is synchronous and cheap: the event is appended to a
//! pending batch and to a bounded ring of recent events kept for inspection.
//! A full batch is handed to the [`Transport`].
//!
//! ERROR HANDLING
//! ==============
//! Metadata values that fail to serialize are dropped from the event. A
//! transport failure drops the batch: no retry, no surfacing to the UI.

#[cfg(test)]
#[path = "telemetry_test.rs"]
mod telemetry_test;

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::preferences::Preferences;
use crate::session::Session;
use crate::store::Store;

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("telemetry transport failed: {0}")]
    Transport(String),
    #[error("telemetry encode failed: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub name: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub session_id: Option<Uuid>,
    pub metadata: Map<String, Value>,
}

/// Flat key/value event metadata.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Metadata {
    fields: Map<String, Value>,
}

impl Metadata {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `key`. A value that cannot be serialized is left out.
    #[must_use]
    pub fn with<V: Serialize + ?Sized>(mut self, key: &str, value: &V) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.fields.insert(key.to_owned(), value);
            }
            Err(err) => log::debug!("telemetry metadata {key} dropped: {err}"),
        }
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.fields
    }
}

impl From<Map<String, Value>> for Metadata {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

/// Destination for telemetry batches.
pub trait Transport {
    /// Forward one batch. Must be fast; callers never retry.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError`] when the batch could not be handed off.
    fn send(&self, batch: &[TelemetryEvent]) -> Result<(), TelemetryError>;
}

/// Writes each event to the `log` facade at debug level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogTransport;

impl Transport for LogTransport {
    fn send(&self, batch: &[TelemetryEvent]) -> Result<(), TelemetryError> {
        for event in batch {
            log::debug!(
                "telemetry {} at {} {}",
                event.name,
                event.timestamp,
                Value::Object(event.metadata.clone())
            );
        }
        Ok(())
    }
}

/// Collects sent events in memory. Clones share the same sink.
#[derive(Clone, Debug, Default)]
pub struct MemoryTransport {
    sent: Rc<RefCell<Vec<TelemetryEvent>>>,
    batches: Rc<Cell<usize>>,
    failing: Rc<Cell<bool>>,
}

impl MemoryTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every send fail, as if the collector were unreachable.
    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    #[must_use]
    pub fn sent(&self) -> Vec<TelemetryEvent> {
        self.sent.borrow().clone()
    }

    #[must_use]
    pub fn batches(&self) -> usize {
        self.batches.get()
    }
}

impl Transport for MemoryTransport {
    fn send(&self, batch: &[TelemetryEvent]) -> Result<(), TelemetryError> {
        if self.failing.get() {
            return Err(TelemetryError::Transport("collector unreachable".to_owned()));
        }
        self.batches.set(self.batches.get() + 1);
        self.sent.borrow_mut().extend_from_slice(batch);
        Ok(())
    }
}

/// Hands batches to `navigator.sendBeacon`, which queues them without
/// blocking and survives page unload.
#[cfg(feature = "hydrate")]
#[derive(Clone, Debug)]
pub struct BeaconTransport {
    endpoint: String,
}

#[cfg(feature = "hydrate")]
impl BeaconTransport {
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into() }
    }
}

#[cfg(feature = "hydrate")]
impl Transport for BeaconTransport {
    fn send(&self, batch: &[TelemetryEvent]) -> Result<(), TelemetryError> {
        let body = serde_json::to_string(batch)?;
        let window = web_sys::window().ok_or_else(|| TelemetryError::Transport("no window".to_owned()))?;
        let queued = window
            .navigator()
            .send_beacon_with_opt_str(&self.endpoint, Some(&body))
            .map_err(|err| TelemetryError::Transport(format!("{err:?}")))?;
        if queued {
            Ok(())
        } else {
            Err(TelemetryError::Transport("beacon rejected by user agent".to_owned()))
        }
    }
}

/// Event buffer in front of a transport.
pub struct Telemetry {
    transport: Box<dyn Transport>,
    pending: RefCell<Vec<TelemetryEvent>>,
    recent: RefCell<VecDeque<TelemetryEvent>>,
    recent_limit: usize,
    batch_size: usize,
}

impl Telemetry {
    pub fn new(transport: Box<dyn Transport>, config: &StoreConfig) -> Self {
        Self {
            transport,
            pending: RefCell::new(Vec::new()),
            recent: RefCell::new(VecDeque::new()),
            recent_limit: config.telemetry_buffer_limit.max(1),
            batch_size: config.telemetry_batch_size.max(1),
        }
    }

    /// Buffer one event, forwarding the batch once it is full.
    pub fn record(&self, event: TelemetryEvent) {
        {
            let mut recent = self.recent.borrow_mut();
            if recent.len() >= self.recent_limit {
                recent.pop_front();
            }
            recent.push_back(event.clone());
        }
        let full = {
            let mut pending = self.pending.borrow_mut();
            pending.push(event);
            pending.len() >= self.batch_size
        };
        if full {
            self.flush();
        }
    }

    /// Forward whatever is pending now.
    pub fn flush(&self) {
        let batch = std::mem::take(&mut *self.pending.borrow_mut());
        if batch.is_empty() {
            return;
        }
        if let Err(err) = self.transport.send(&batch) {
            log::debug!("telemetry batch of {} dropped: {err}", batch.len());
        }
    }

    /// Events not yet handed to the transport.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.borrow().len()
    }

    /// The most recent events, oldest first, bounded by the buffer limit.
    #[must_use]
    pub fn recent(&self) -> Vec<TelemetryEvent> {
        self.recent.borrow().iter().cloned().collect()
    }
}

/// `track`/`time` entry points bound to a store for clock, session, and
/// consent lookups.
pub struct PerformanceTracker<'a> {
    telemetry: &'a Telemetry,
    store: &'a Store,
}

impl<'a> PerformanceTracker<'a> {
    #[must_use]
    pub fn new(telemetry: &'a Telemetry, store: &'a Store) -> Self {
        Self { telemetry, store }
    }

    /// Record `name` with `metadata`. Suppressed when the visitor declined
    /// analytics.
    pub fn track(&self, name: &str, metadata: Metadata) {
        if !Preferences::new(self.store).load().analytics_allowed() {
            return;
        }
        self.telemetry.record(TelemetryEvent {
            name: name.to_owned(),
            timestamp: self.store.now_ms(),
            session_id: Some(Session::new(self.store).id()),
            metadata: metadata.into_map(),
        });
    }

    /// Record `name` with a `duration_ms` measured from `started_at_ms`.
    pub fn time(&self, name: &str, started_at_ms: i64, metadata: Metadata) {
        let duration_ms = self.store.now_ms().saturating_sub(started_at_ms).max(0);
        self.track(name, metadata.with("duration_ms", &duration_ms));
    }

    pub fn flush(&self) {
        self.telemetry.flush();
    }
}
