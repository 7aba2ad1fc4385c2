#![forbid(unsafe_code)]

//! Integration tests: bindings against the document store.

use std::cell::RefCell;
use std::rc::Rc;

use firelink_core::{Identity, Value};
use firelink_harness::{
    CallLog, Card, FakeClock, MockDocumentClient, MockIdentitySource, NO_USER, card,
};
use firelink_runtime::{
    AmbientStateProvider, BoundNode, DocumentAdapter, IdentityPolicy, ListenerMap, Props,
    ProviderConfig, Registration, document_connect,
};
use serde_json::json;

type Node = BoundNode<DocumentAdapter<MockDocumentClient>, Card>;

/// Records every snapshot a listener receives.
#[derive(Clone, Default)]
struct MockCallback {
    calls: Rc<RefCell<Vec<Value>>>,
}

impl MockCallback {
    fn handler(&self) -> impl Fn(&Value) + 'static {
        let calls = Rc::clone(&self.calls);
        move |snapshot: &Value| calls.borrow_mut().push(snapshot.clone())
    }

    fn calls(&self) -> Vec<Value> {
        self.calls.borrow().clone()
    }
}

struct Fixture {
    clock: FakeClock,
    store: Rc<MockDocumentClient>,
    cb: MockCallback,
    provider: AmbientStateProvider,
}

fn message() -> Value {
    json!({ "message": "Hello from the document store!" })
}

fn fixture() -> Fixture {
    let clock = FakeClock::new();
    let log = CallLog::new();
    let auth = MockIdentitySource::responding(
        "auth",
        &clock,
        &log,
        Identity::new(json!({ "uid": 123 })),
    );
    let store = MockDocumentClient::new(&clock, &log, message());
    let mut provider = AmbientStateProvider::new(
        ProviderConfig::new()
            .identity_source(auth)
            .document_client(Rc::clone(&store))
            .prop("arbitraryProp", "arbitrary"),
    );
    provider.activate().unwrap();
    Fixture {
        clock,
        store,
        cb: MockCallback::default(),
        provider,
    }
}

fn own_props() -> Props {
    Props::new().with("passingIn", json!("Hi There!"))
}

fn mount_single(fx: &Fixture) -> Node {
    let cb = fx.cb.clone();
    document_connect::<MockDocumentClient>()
        .listeners(move |ctx| Ok(Registration::single(ctx.source.on_snapshot(cb.handler()))))
        .wrap(card)
        .mount(&fx.provider.scope(), own_props())
        .unwrap()
}

fn mount_multi(fx: &Fixture) -> Node {
    let cb = fx.cb.clone();
    document_connect::<MockDocumentClient>()
        .listeners(move |ctx| {
            let mut map = ListenerMap::new();
            for key in ["listener1", "listener2", "listener3"] {
                let store = Rc::clone(ctx.source);
                let handler = cb.handler();
                map = map.listener(key, move || store.on_snapshot(handler));
            }
            Ok(map.into())
        })
        .wrap(card)
        .mount(&fx.provider.scope(), own_props())
        .unwrap()
}

// ============================================================================
// Single listener
// ============================================================================

#[test]
fn single_receives_props_from_context() {
    let fx = fixture();
    let node = mount_single(&fx);
    assert_eq!(node.render().unwrap().arbitrary, Some(json!("arbitrary")));
}

#[test]
fn single_receives_identity_when_loaded() {
    let fx = fixture();
    let node = mount_single(&fx);
    assert_eq!(node.render().unwrap().user, NO_USER);
    fx.clock.run_only_pending();
    assert_eq!(node.render().unwrap().user, "123");
}

#[test]
fn single_receives_own_props() {
    let fx = fixture();
    let node = mount_single(&fx);
    assert_eq!(node.render().unwrap().passing_in.as_deref(), Some("Hi There!"));
}

#[test]
fn single_listener_invokes_callback() {
    let fx = fixture();
    let _node = mount_single(&fx);
    // identity arrives first and rebinds; the rebound listener then fires
    fx.clock.run_all();
    assert_eq!(fx.cb.calls(), [message()]);
}

#[test]
fn single_canceler_invoked_on_unmount() {
    let fx = fixture();
    let node = mount_single(&fx);
    assert_eq!(node.subscription_count(), 1);
    assert_eq!(node.event_kinds(), [None]);
    assert_eq!(node.unmount(), 1);
    assert_eq!(fx.store.cancelled(), 1);
}

// ============================================================================
// Multiple listeners
// ============================================================================

#[test]
fn multiple_listeners_each_invoked_and_cancelled() {
    let fx = fixture();
    let node = mount_multi(&fx);
    assert_eq!(node.subscription_count(), 3);

    fx.clock.run_all();
    assert_eq!(fx.cb.calls().len(), 3);

    drop(node);
    assert_eq!(fx.store.cancelled(), 3);
    assert_eq!(fx.store.live(), 0);
}

// ============================================================================
// Local state and identity drift
// ============================================================================

#[test]
fn listener_pushes_into_local_state() {
    let fx = fixture();
    let node = document_connect::<MockDocumentClient>()
        .listeners(|ctx| {
            let node = ctx.node.clone();
            let cancel = ctx
                .source
                .on_snapshot(move |snap| node.set_state("doc", snap.clone()));
            Ok(Registration::single(cancel))
        })
        .wrap(|props: &Props| props.value("doc").cloned())
        .mount(&fx.provider.scope(), Props::new())
        .unwrap();
    assert_eq!(node.render().unwrap(), None);

    fx.clock.run_all();
    assert!(node.is_dirty());
    assert_eq!(node.render().unwrap(), Some(message()));
}

#[test]
fn identity_change_rebinds_listeners() {
    let fx = fixture();
    let node = mount_single(&fx);
    assert_eq!(fx.store.subscribed(), 1);

    fx.clock.run_only_pending();
    assert_eq!(fx.store.cancelled(), 1);
    assert_eq!(fx.store.subscribed(), 2);
    assert_eq!(node.subscription_count(), 1);

    drop(node);
    assert_eq!(fx.store.live(), 0);
}

#[test]
fn pinned_binding_keeps_original_listener() {
    let fx = fixture();
    let cb = fx.cb.clone();
    let node = document_connect::<MockDocumentClient>()
        .listeners(move |ctx| Ok(Registration::single(ctx.source.on_snapshot(cb.handler()))))
        .identity_policy(IdentityPolicy::Pinned)
        .wrap(card)
        .mount(&fx.provider.scope(), own_props())
        .unwrap();

    fx.clock.run_only_pending();
    assert_eq!(fx.cb.calls(), [message()]);
    assert_eq!(fx.store.subscribed(), 1);
    assert_eq!(node.render().unwrap().user, "123");
    assert!(node.identity().is_none());

    assert_eq!(node.unmount(), 1);
    assert_eq!(fx.store.cancelled(), 1);
}
