use super::*;

#[test]
fn default_scope_is_persistent() {
    assert_eq!(Scope::default(), Scope::Persistent);
}

#[test]
fn default_policy_degrades() {
    assert_eq!(ConsentPolicy::default(), ConsentPolicy::DegradeToSession);
}

#[test]
fn session_writes_ignore_consent() {
    for policy in [ConsentPolicy::DegradeToSession, ConsentPolicy::Drop] {
        assert_eq!(effective_scope(Scope::Session, false, policy), Some(Scope::Session));
        assert_eq!(effective_scope(Scope::Session, true, policy), Some(Scope::Session));
    }
}

#[test]
fn persistent_with_consent_stays_persistent() {
    for policy in [ConsentPolicy::DegradeToSession, ConsentPolicy::Drop] {
        assert_eq!(effective_scope(Scope::Persistent, true, policy), Some(Scope::Persistent));
    }
}

#[test]
fn persistent_without_consent_never_persists() {
    assert_eq!(
        effective_scope(Scope::Persistent, false, ConsentPolicy::DegradeToSession),
        Some(Scope::Session)
    );
    assert_eq!(effective_scope(Scope::Persistent, false, ConsentPolicy::Drop), None);
}

#[test]
fn scope_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&Scope::Session).unwrap(), "\"session\"");
    let policy: ConsentPolicy = serde_json::from_str("\"drop\"").unwrap();
    assert_eq!(policy, ConsentPolicy::Drop);
}
