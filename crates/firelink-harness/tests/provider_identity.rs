#![forbid(unsafe_code)]

//! Integration tests: the ambient state provider and identity propagation.

use std::rc::Rc;

use firelink_core::{Identity, IdentitySource, NotificationMode};
use firelink_harness::{CallLog, FakeClock, LogCapture, MockIdentitySource, NO_USER, card};
use firelink_runtime::{AmbientStateProvider, Phase, Props, ProviderConfig, identity_connect};
use serde_json::json;

fn user_token() -> Identity {
    Identity::new(json!({ "uid": 123 }))
}

fn auth_stub(clock: &FakeClock, log: &CallLog) -> Rc<MockIdentitySource> {
    MockIdentitySource::responding("auth", clock, log, user_token())
}

// ============================================================================
// Published value set
// ============================================================================

#[test]
fn publishes_static_props_and_clients() {
    let (clock, log) = (FakeClock::new(), CallLog::new());
    let auth = auth_stub(&clock, &log);
    let provider = AmbientStateProvider::new(
        ProviderConfig::new()
            .identity_source(Rc::clone(&auth))
            .prop("arbitraryProp", true)
            .prop("anotherProp", true),
    );
    let set = provider.current();
    assert_eq!(set.get("arbitraryProp"), Some(&json!(true)));
    assert_eq!(set.get("anotherProp"), Some(&json!(true)));
    assert!(set.clients().identity_source().is_some());
    assert!(set.get("identity").is_none());
}

#[test]
fn identity_set_when_source_calls_back() {
    let (clock, log) = (FakeClock::new(), CallLog::new());
    let auth = auth_stub(&clock, &log);
    let mut provider =
        AmbientStateProvider::new(ProviderConfig::new().identity_source(Rc::clone(&auth)));
    provider.activate().unwrap();
    assert!(provider.identity().is_none());

    clock.run_only_pending();
    assert_eq!(provider.identity(), Some(user_token()));
    assert_eq!(provider.current().get("identity"), Some(&json!({ "uid": 123 })));
}

#[test]
fn sign_out_removes_identity() {
    let (clock, log) = (FakeClock::new(), CallLog::new());
    let auth = auth_stub(&clock, &log);
    let mut provider =
        AmbientStateProvider::new(ProviderConfig::new().identity_source(Rc::clone(&auth)));
    provider.activate().unwrap();
    clock.run_only_pending();
    auth.emit(None);
    assert!(provider.current().get("identity").is_none());
}

#[test]
fn notification_mode_picks_subscription_method() {
    for (mode, method) in [
        (NotificationMode::StateChange, "auth:onAuthStateChanged"),
        (NotificationMode::TokenRefreshInclusive, "auth:onIdTokenChanged"),
    ] {
        let (clock, log) = (FakeClock::new(), CallLog::new());
        let auth = auth_stub(&clock, &log);
        let mut provider = AmbientStateProvider::new(
            ProviderConfig::new()
                .identity_source(Rc::clone(&auth))
                .notification_mode(mode),
        );
        provider.activate().unwrap();
        assert_eq!(log.entries(), [method]);
    }
}

// ============================================================================
// Descendants
// ============================================================================

#[test]
fn child_without_listeners_sees_identity_after_delay() {
    let (clock, log) = (FakeClock::new(), CallLog::new());
    let auth = auth_stub(&clock, &log);
    let mut provider = AmbientStateProvider::new(
        ProviderConfig::new()
            .identity_source(Rc::clone(&auth))
            .prop("arbitraryProp", "arbitrary"),
    );
    provider.activate().unwrap();

    let node = identity_connect()
        .dispatchers(|_| firelink_runtime::DispatchSet::new().with("onClick", |_| {}))
        .wrap(card)
        .mount(&provider.scope(), Props::new())
        .unwrap();

    let before = node.render().unwrap();
    assert_eq!(before.user, NO_USER);
    assert!(before.click.is_some());
    assert!(!before.keys.iter().any(|k| k == "identity"));
    assert!(!node.is_dirty());

    clock.run_only_pending();
    assert!(node.is_dirty());
    let after = node.render().unwrap();
    assert_eq!(after.user, "123");
    assert_eq!(after.arbitrary, Some(json!("arbitrary")));
}

#[test]
fn every_active_descendant_observes_identity() {
    let (clock, log) = (FakeClock::new(), CallLog::new());
    let auth = auth_stub(&clock, &log);
    let mut provider =
        AmbientStateProvider::new(ProviderConfig::new().identity_source(Rc::clone(&auth)));
    provider.activate().unwrap();

    let bound = identity_connect().wrap(card);
    let parent = bound.mount(&provider.scope(), Props::new()).unwrap();
    let children: Vec<_> = (0..3)
        .map(|_| bound.mount(parent.scope(), Props::new()).unwrap())
        .collect();
    assert_eq!(provider.listener_count(), 4);

    clock.run_only_pending();
    for node in children.iter().chain(std::iter::once(&parent)) {
        assert_eq!(node.render().unwrap().user, "123");
    }
}

#[test]
fn inner_provider_shadows_outer() {
    let outer = AmbientStateProvider::new(ProviderConfig::new().prop("level", "outer"));
    let inner = AmbientStateProvider::new(ProviderConfig::new().prop("level", "inner"));
    let bound = identity_connect().wrap(|props: &Props| props.str("level").map(str::to_string));
    let a = bound.mount(&outer.scope(), Props::new()).unwrap();
    let b = bound.mount(&inner.scope(), Props::new()).unwrap();
    assert_eq!(a.render().unwrap().as_deref(), Some("outer"));
    assert_eq!(b.render().unwrap().as_deref(), Some("inner"));
}

// ============================================================================
// Source replacement and teardown
// ============================================================================

#[test]
fn replacing_source_cancels_before_subscribing() {
    let (clock, log) = (FakeClock::new(), CallLog::new());
    let first = MockIdentitySource::new("first", &clock, &log);
    let second = MockIdentitySource::new("second", &clock, &log);
    let mut provider =
        AmbientStateProvider::new(ProviderConfig::new().identity_source(Rc::clone(&first)));
    provider.activate().unwrap();
    provider.set_identity_source(Some(Rc::clone(&second) as Rc<dyn IdentitySource>));

    assert_eq!(
        log.entries(),
        [
            "first:onAuthStateChanged",
            "first:cancel",
            "second:onAuthStateChanged"
        ]
    );
    assert_eq!(first.subscriber_count(), 0);
    assert_eq!(second.subscriber_count(), 1);
}

#[test]
fn replacement_is_logged() {
    let (clock, log) = (FakeClock::new(), CallLog::new());
    let first = MockIdentitySource::new("first", &clock, &log);
    let capture = LogCapture::new();
    capture.run(|| {
        let mut provider =
            AmbientStateProvider::new(ProviderConfig::new().identity_source(Rc::clone(&first)));
        provider.activate().unwrap();
        provider.set_identity_source(None);
    });
    let lines = capture.matching(&["firelink::provider", "identity source replaced"]);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("cancelled=true"));
    assert!(lines[0].contains("replacement=false"));
}

#[test]
fn removing_source_stops_updates_and_keeps_identity() {
    let (clock, log) = (FakeClock::new(), CallLog::new());
    let auth = auth_stub(&clock, &log);
    let mut provider =
        AmbientStateProvider::new(ProviderConfig::new().identity_source(Rc::clone(&auth)));
    provider.activate().unwrap();
    clock.run_only_pending();
    provider.set_identity_source(None);

    auth.emit(None);
    assert_eq!(provider.identity(), Some(user_token()));
    assert!(provider.current().clients().identity_source().is_none());
}

#[test]
fn deactivation_without_subscription_is_noop() {
    let mut provider = AmbientStateProvider::new(ProviderConfig::new());
    provider.activate().unwrap();
    provider.deactivate();
    provider.deactivate();
    assert_eq!(provider.phase(), Phase::Deactivated);
}

#[test]
fn drop_cancels_subscription() {
    let (clock, log) = (FakeClock::new(), CallLog::new());
    let auth = auth_stub(&clock, &log);
    {
        let mut provider =
            AmbientStateProvider::new(ProviderConfig::new().identity_source(Rc::clone(&auth)));
        provider.activate().unwrap();
    }
    assert_eq!(log.count("auth:cancel"), 1);
    assert_eq!(auth.subscriber_count(), 0);
    // the pending answer finds no subscriber
    clock.run_only_pending();
}
