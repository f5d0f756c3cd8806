//! The site context: one object built at application start that every page
//! component borrows its storage views from.
//!
//! DESIGN
//! ======
//! Components never touch a medium directly and never reach for a global.
//! They hold a `SiteContext` (cheap to clone, `Rc` inside) and ask it for a
//! short-lived view: `forms()`, `journey()`, `lead_intent()`, and so on. Tests
//! build the same context over `MemoryMedium`s and a `ManualClock`.

#[cfg(test)]
#[path = "context_test.rs"]
mod context_test;

use std::rc::Rc;

use crate::clock::{Clock, SystemClock};
use crate::config::StoreConfig;
use crate::contact::ContactForm;
use crate::forms::FormDrafts;
use crate::idle;
use crate::intent::{LeadIntent, PackageInterest};
use crate::journey::JourneyTracker;
use crate::medium::{Medium, MemoryMedium};
use crate::preferences::Preferences;
use crate::session::Session;
use crate::store::Store;
use crate::telemetry::{LogTransport, Metadata, PerformanceTracker, Telemetry, Transport};

struct ContextInner {
    config: StoreConfig,
    store: Store,
    telemetry: Telemetry,
}

#[derive(Clone)]
pub struct SiteContext {
    inner: Rc<ContextInner>,
}

impl SiteContext {
    pub fn new(
        session: Box<dyn Medium>,
        persistent: Box<dyn Medium>,
        clock: Rc<dyn Clock>,
        transport: Box<dyn Transport>,
        config: StoreConfig,
    ) -> Self {
        let store = Store::new(session, persistent, clock, &config);
        let telemetry = Telemetry::new(transport, &config);
        Self { inner: Rc::new(ContextInner { config, store, telemetry }) }
    }

    /// A context over fresh in-memory media, for SSR and native use.
    #[must_use]
    pub fn in_memory(config: StoreConfig) -> Self {
        Self::new(
            Box::new(MemoryMedium::new()),
            Box::new(MemoryMedium::new()),
            Rc::new(SystemClock),
            Box::new(LogTransport),
            config,
        )
    }

    /// A context over `sessionStorage`/`localStorage`. Telemetry goes to the
    /// configured collector by beacon, or to the log when none is set.
    #[cfg(feature = "hydrate")]
    #[must_use]
    pub fn browser(config: StoreConfig) -> Self {
        use crate::telemetry::BeaconTransport;
        use crate::web::WebMedium;

        let transport: Box<dyn Transport> = match &config.telemetry_endpoint {
            Some(endpoint) => Box::new(BeaconTransport::new(endpoint.clone())),
            None => Box::new(LogTransport),
        };
        Self::new(
            Box::new(WebMedium::session()),
            Box::new(WebMedium::local()),
            Rc::new(SystemClock),
            transport,
            config,
        )
    }

    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// The raw key/value store.
    #[must_use]
    pub fn storage(&self) -> &Store {
        &self.inner.store
    }

    #[must_use]
    pub fn telemetry(&self) -> &Telemetry {
        &self.inner.telemetry
    }

    // --- Views ---

    #[must_use]
    pub fn forms(&self) -> FormDrafts<'_> {
        FormDrafts::new(&self.inner.store, self.inner.config.form_draft_ttl_ms)
    }

    #[must_use]
    pub fn session(&self) -> Session<'_> {
        Session::new(&self.inner.store)
    }

    #[must_use]
    pub fn journey(&self) -> JourneyTracker<'_> {
        JourneyTracker::new(&self.inner.store, self.inner.config.journey_limit)
    }

    #[must_use]
    pub fn lead_intent(&self) -> LeadIntent<'_> {
        LeadIntent::new(&self.inner.store)
    }

    #[must_use]
    pub fn package_interest(&self) -> PackageInterest<'_> {
        PackageInterest::new(&self.inner.store, self.inner.config.package_interest_ttl_ms)
    }

    #[must_use]
    pub fn preferences(&self) -> Preferences<'_> {
        Preferences::new(&self.inner.store)
    }

    #[must_use]
    pub fn performance(&self) -> PerformanceTracker<'_> {
        PerformanceTracker::new(&self.inner.telemetry, &self.inner.store)
    }

    #[must_use]
    pub fn contact_form(&self, form_id: &str) -> ContactForm<'_> {
        ContactForm::new(self, form_id)
    }

    // --- Page hooks ---

    /// Record a page view: journey entry, first-seen marker, and a deferred
    /// `page_view` event. Visit markers persist only once the visitor has
    /// granted analytics consent.
    pub fn page_view(&self, path: &str) {
        let consent = self.preferences().load().analytics_granted();
        self.journey().mark_visited_with_consent(path, consent);
        let metadata = Metadata::new()
            .with("path", path)
            .with("returning", &self.journey().is_returning_user());
        self.track_when_idle("page_view", metadata);
    }

    /// Defer `track` to idle time.
    pub fn track_when_idle(&self, name: &str, metadata: Metadata) {
        let ctx = self.clone();
        let name = name.to_owned();
        idle::schedule(move || ctx.performance().track(&name, metadata));
    }
}
