//! Contact form glue: prefill from the handoff, build the relay payload.
//!
//! Nothing here transmits on its own. Only an explicit submission posts the
//! payload to the form relay, and a successful post clears the draft so it
//! cannot repopulate the form on a later visit.
//!
//! Client-side (hydrate): real HTTP via `gloo-net`.
//! Server-side/native: [`submit`] returns an error string.

#![allow(clippy::unused_async)]

#[cfg(test)]
#[path = "contact_test.rs"]
mod contact_test;

use serde::{Deserialize, Serialize};

use crate::context::SiteContext;
use crate::forms::FormFields;

/// Field the package-interest handoff is written into.
pub const PACKAGE_FIELD: &str = "package";

/// What the form relay receives.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactPayload {
    pub form_id: String,
    pub fields: FormFields,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    /// Verticals the visitor showed interest in, first-marked first.
    pub verticals: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landing_page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_from: Option<String>,
}

pub struct ContactForm<'a> {
    ctx: &'a SiteContext,
    form_id: String,
}

impl<'a> ContactForm<'a> {
    #[must_use]
    pub fn new(ctx: &'a SiteContext, form_id: &str) -> Self {
        Self { ctx, form_id: form_id.to_owned() }
    }

    /// Initial field values: the saved draft, plus the package of interest
    /// when the draft does not already name one. The package handoff is
    /// consumed either way.
    pub fn prefill(&self) -> FormFields {
        let mut fields = self.ctx.forms().load(&self.form_id).unwrap_or_default();
        if let Some(package) = self.ctx.package_interest().take() {
            let slot = fields.entry(PACKAGE_FIELD.to_owned()).or_default();
            if slot.trim().is_empty() {
                *slot = package;
            }
        }
        fields
    }

    /// Save the in-progress values (call from the debounced change handler).
    pub fn save_draft(&self, fields: &FormFields) {
        self.ctx.forms().save(&self.form_id, fields);
    }

    /// Build the relay payload for `fields`.
    #[must_use]
    pub fn payload(&self, fields: &FormFields) -> ContactPayload {
        let journey = self.ctx.journey().get_journey();
        let package = fields
            .get(PACKAGE_FIELD)
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(str::to_owned);
        ContactPayload {
            form_id: self.form_id.clone(),
            fields: fields.clone(),
            package,
            verticals: self.ctx.lead_intent().verticals(),
            landing_page: journey.first().map(|e| e.path.clone()),
            submitted_from: journey.last().map(|e| e.path.clone()),
        }
    }

    /// Forget the draft after the relay accepted the submission.
    pub fn submitted(&self) {
        self.ctx.forms().clear(&self.form_id);
    }

    /// Post `fields` to the configured relay, clearing the draft on success.
    ///
    /// # Errors
    ///
    /// Returns an error string when no endpoint is configured or the relay
    /// request fails. The draft is kept so the visitor can retry.
    pub async fn submit(&self, fields: &FormFields) -> Result<(), String> {
        let endpoint = self
            .ctx
            .config()
            .contact_endpoint
            .clone()
            .ok_or_else(|| "no contact endpoint configured".to_owned())?;
        let payload = self.payload(fields);
        submit(&endpoint, &payload).await?;
        self.submitted();
        Ok(())
    }
}

#[cfg(any(test, feature = "hydrate"))]
fn relay_failed_message(status: u16) -> String {
    format!("form relay rejected submission: {status}")
}

/// Post a payload to the form relay as JSON.
///
/// # Errors
///
/// Returns an error string if the request fails or the relay responds with a
/// non-OK status.
#[cfg_attr(not(feature = "hydrate"), allow(unused_variables))]
pub async fn submit(endpoint: &str, payload: &ContactPayload) -> Result<(), String> {
    #[cfg(feature = "hydrate")]
    {
        let resp = gloo_net::http::Request::post(endpoint)
            .header("Accept", "application/json")
            .json(payload)
            .map_err(|e| e.to_string())?
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let status = resp.status();
        if !(200..300).contains(&status) {
            return Err(relay_failed_message(status));
        }
        Ok(())
    }
    #[cfg(not(feature = "hydrate"))]
    {
        Err("not available on server".to_owned())
    }
}

/// Fire-and-forget [`ContactForm::submit`] from an event handler.
#[cfg(feature = "hydrate")]
pub fn submit_in_background(ctx: &SiteContext, form_id: &str, fields: FormFields) {
    let ctx = ctx.clone();
    let form_id = form_id.to_owned();
    wasm_bindgen_futures::spawn_local(async move {
        if let Err(err) = ctx.contact_form(&form_id).submit(&fields).await {
            log::warn!("contact submission failed: {err}");
        }
    });
}
