use std::rc::Rc;

use serde_json::json;

use super::*;
use crate::clock::ManualClock;
use crate::config::StoreConfig;
use crate::medium::MemoryMedium;
use crate::telemetry::LogTransport;

fn ctx() -> SiteContext {
    SiteContext::new(
        Box::new(MemoryMedium::new()),
        Box::new(MemoryMedium::new()),
        Rc::new(ManualClock::new(0)),
        Box::new(LogTransport),
        StoreConfig::default(),
    )
}

fn fields(pairs: &[(&str, &str)]) -> FormFields {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}

#[test]
fn prefill_applies_package_interest_once() {
    let ctx = ctx();
    ctx.package_interest().set("Pro");
    let form = ctx.contact_form("contact");

    assert_eq!(form.prefill(), fields(&[("package", "Pro")]));
    assert_eq!(ctx.package_interest().get(), None);
    assert_eq!(form.prefill(), FormFields::new());
}

#[test]
fn prefill_keeps_package_already_in_draft() {
    let ctx = ctx();
    let form = ctx.contact_form("contact");
    form.save_draft(&fields(&[("name", "Dana"), ("package", "Starter")]));
    ctx.package_interest().set("Pro");

    let prefilled = form.prefill();
    assert_eq!(prefilled.get("package").map(String::as_str), Some("Starter"));
    assert_eq!(prefilled.get("name").map(String::as_str), Some("Dana"));
    assert_eq!(ctx.package_interest().get(), None);
}

#[test]
fn prefill_fills_blank_package_field() {
    let ctx = ctx();
    let form = ctx.contact_form("contact");
    form.save_draft(&fields(&[("name", "Dana"), ("package", "")]));
    ctx.package_interest().set("Growth");
    assert_eq!(form.prefill().get("package").map(String::as_str), Some("Growth"));
}

#[test]
fn payload_carries_intent_and_journey() {
    let ctx = ctx();
    ctx.journey().mark_visited("/healthcare");
    ctx.lead_intent().mark_interest("healthcare");
    ctx.journey().mark_visited("/contact");
    let form = ctx.contact_form("contact");

    let payload = form.payload(&fields(&[("email", "dana@example.com"), ("package", " Pro ")]));
    assert_eq!(payload.form_id, "contact");
    assert_eq!(payload.package.as_deref(), Some("Pro"));
    assert_eq!(payload.verticals, vec!["healthcare".to_owned()]);
    assert_eq!(payload.landing_page.as_deref(), Some("/healthcare"));
    assert_eq!(payload.submitted_from.as_deref(), Some("/contact"));
}

#[test]
fn payload_omits_absent_optionals_on_the_wire() {
    let ctx = ctx();
    let payload = ctx.contact_form("contact").payload(&fields(&[("name", "Dana")]));
    assert_eq!(
        serde_json::to_value(&payload).unwrap(),
        json!({"form_id": "contact", "fields": {"name": "Dana"}, "verticals": []})
    );
}

#[test]
fn submitted_clears_draft() {
    let ctx = ctx();
    let form = ctx.contact_form("contact");
    form.save_draft(&fields(&[("name", "Dana")]));
    form.submitted();
    assert_eq!(ctx.forms().load("contact"), None);
}

#[test]
fn relay_failed_message_formats_status() {
    assert_eq!(relay_failed_message(422), "form relay rejected submission: 422");
}
