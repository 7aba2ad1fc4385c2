#![forbid(unsafe_code)]

//! The ambient state provider.
//!
//! An [`AmbientStateProvider`] owns one [`AmbientChannel`] and, once
//! activated, the subscription to its identity source. Every identity
//! notification republishes the ambient value set with the new identity;
//! every prop change republishes it with the new props. Nodes mounted in the
//! provider's [`Scope`] see each published set.
//!
//! # Invariants
//!
//! 1. At most one identity subscription is live at any time. Replacing the
//!    source cancels the old subscription strictly before subscribing to
//!    the new one.
//! 2. A notification delivered after its subscription was cancelled is
//!    ignored.
//! 3. Deactivating is idempotent and safe when no subscription was ever
//!    established.
//!
//! # Example
//!
//! ```ignore
//! let mut provider = AmbientStateProvider::new(
//!     ProviderConfig::new()
//!         .identity_source(Rc::clone(&auth))
//!         .document_client(Rc::clone(&store))
//!         .prop("theme", "dark"),
//! );
//! provider.activate()?;
//! let node = bound.mount(&provider.scope(), Props::new())?;
//! ```

use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use firelink_core::{
    BindError, Canceler, Identity, IdentityCallback, IdentitySource, NotificationMode,
    ProviderOptions, RealtimeClient, Value,
};
use indexmap::IndexMap;

use crate::ambient::{AmbientChannel, AmbientValueSet, Clients, Scope};
use crate::binder::Phase;

/// Options plus client handles for one provider.
#[derive(Clone, Debug, Default)]
pub struct ProviderConfig {
    options: ProviderOptions,
    clients: Clients,
}

impl ProviderConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from parsed options.
    #[must_use]
    pub fn from_options(options: ProviderOptions) -> Self {
        Self {
            options,
            clients: Clients::new(),
        }
    }

    #[must_use]
    pub fn identity_source<S: IdentitySource + 'static>(mut self, source: Rc<S>) -> Self {
        self.clients.set_identity_source(Some(source as Rc<dyn IdentitySource>));
        self
    }

    #[must_use]
    pub fn realtime_client<C: RealtimeClient + 'static>(mut self, client: Rc<C>) -> Self {
        self.clients.set_realtime(Some(client as Rc<dyn RealtimeClient>));
        self
    }

    /// Any document-store client; bindings reach it by its concrete type.
    #[must_use]
    pub fn document_client<C: 'static>(mut self, client: Rc<C>) -> Self {
        self.clients.set_document(Some(client as Rc<dyn Any>));
        self
    }

    #[must_use]
    pub fn notification_mode(mut self, mode: NotificationMode) -> Self {
        self.options.notification_mode = mode;
        self
    }

    /// Shorthand for choosing the token-refresh-inclusive mode.
    #[must_use]
    pub fn token_refresh(self, enabled: bool) -> Self {
        self.notification_mode(NotificationMode::from_token_refresh(enabled))
    }

    /// Add a static passthrough prop.
    #[must_use]
    pub fn prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.props.insert(key.into(), value.into());
        self
    }
}

/// Live identity subscription. `live` is cleared on cancel so late
/// notifications are dropped.
struct IdentitySubscription {
    canceler: Canceler,
    live: Rc<Cell<bool>>,
}

impl IdentitySubscription {
    fn cancel(self) {
        self.live.set(false);
        self.canceler.cancel();
    }
}

/// Owns the identity subscription and publishes the ambient value set.
pub struct AmbientStateProvider {
    mode: NotificationMode,
    props: IndexMap<String, Value>,
    clients: Clients,
    channel: Rc<AmbientChannel>,
    subscription: Option<IdentitySubscription>,
    phase: Phase,
}

impl AmbientStateProvider {
    /// Build a provider and publish its initial value set.
    #[must_use]
    pub fn new(config: ProviderConfig) -> Self {
        let ProviderConfig { options, clients } = config;
        let channel = Rc::new(AmbientChannel::new(AmbientValueSet::new(
            options.props.clone(),
            clients.clone(),
        )));
        Self {
            mode: options.notification_mode,
            props: options.props,
            clients,
            channel,
            subscription: None,
            phase: Phase::Uninitialized,
        }
    }

    /// Subscribe to the identity source, if one is configured.
    ///
    /// # Errors
    ///
    /// [`BindError::Lifecycle`] unless the provider is uninitialized.
    pub fn activate(&mut self) -> Result<(), BindError> {
        if self.phase != Phase::Uninitialized {
            return Err(BindError::Lifecycle {
                from: self.phase.as_str(),
                to: Phase::Activated.as_str(),
            });
        }
        self.phase = Phase::Activated;
        self.subscribe();
        tracing::debug!(
            target: "firelink::provider",
            mode = ?self.mode,
            identity_source = self.subscription.is_some(),
            props = self.props.len(),
            "activated"
        );
        Ok(())
    }

    /// Replace (or remove) the identity source.
    ///
    /// The old subscription is cancelled before the new one is established.
    /// The current identity is kept until the new source calls back.
    pub fn set_identity_source(&mut self, source: Option<Rc<dyn IdentitySource>>) {
        let had_subscription = self.unsubscribe();
        tracing::debug!(
            target: "firelink::provider",
            cancelled = had_subscription,
            replacement = source.is_some(),
            "identity source replaced"
        );
        self.clients.set_identity_source(source);
        self.republish();
        if self.phase == Phase::Activated {
            self.subscribe();
        }
    }

    /// Set a static prop and republish. Returns whether readers were notified.
    pub fn set_prop(&mut self, key: impl Into<String>, value: impl Into<Value>) -> bool {
        self.props.insert(key.into(), value.into());
        self.republish()
    }

    /// Remove a static prop and republish.
    pub fn remove_prop(&mut self, key: &str) -> Option<Value> {
        let removed = self.props.shift_remove(key);
        if removed.is_some() {
            self.republish();
        }
        removed
    }

    /// Cancel the identity subscription. Safe to call repeatedly.
    pub fn deactivate(&mut self) {
        if self.phase == Phase::Deactivated {
            return;
        }
        let cancelled = self.unsubscribe();
        self.phase = Phase::Deactivated;
        tracing::debug!(target: "firelink::provider", cancelled, "deactivated");
    }

    /// Scope for nodes mounted below this provider.
    #[must_use]
    pub fn scope(&self) -> Scope {
        Scope::with_reader(self.channel.reader())
    }

    /// The currently published set.
    #[must_use]
    pub fn current(&self) -> Rc<AmbientValueSet> {
        self.channel.current()
    }

    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.channel.current().identity().cloned()
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn notification_mode(&self) -> NotificationMode {
        self.mode
    }

    /// Number of nodes currently subscribed to this provider's changes.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.channel.listener_count()
    }

    fn subscribe(&mut self) {
        let Some(source) = self.clients.identity_source().cloned() else {
            return;
        };
        let live = Rc::new(Cell::new(true));
        let callback: IdentityCallback = {
            let live = Rc::clone(&live);
            let channel = Rc::downgrade(&self.channel);
            Rc::new(move |identity: Option<Identity>| {
                if !live.get() {
                    tracing::trace!(
                        target: "firelink::provider",
                        "ignoring identity notification after cancel"
                    );
                    return;
                }
                let Some(channel) = channel.upgrade() else {
                    return;
                };
                let signed_in = identity.is_some();
                let changed = channel.publish_with(move |set| set.with_identity(identity));
                tracing::debug!(
                    target: "firelink::provider",
                    signed_in,
                    changed,
                    "identity updated"
                );
            })
        };
        let canceler = source.subscribe(self.mode, callback);
        self.subscription = Some(IdentitySubscription { canceler, live });
    }

    fn unsubscribe(&mut self) -> bool {
        match self.subscription.take() {
            Some(subscription) => {
                subscription.cancel();
                true
            }
            None => false,
        }
    }

    fn republish(&self) -> bool {
        let props = self.props.clone();
        let clients = self.clients.clone();
        self.channel.publish_with(move |current| {
            AmbientValueSet::new(props, clients).with_identity(current.identity().cloned())
        })
    }
}

impl Drop for AmbientStateProvider {
    fn drop(&mut self) {
        self.deactivate();
    }
}

impl fmt::Debug for AmbientStateProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AmbientStateProvider")
            .field("mode", &self.mode)
            .field("phase", &self.phase)
            .field("props", &self.props)
            .field("clients", &self.clients)
            .field("subscribed", &self.subscription.is_some())
            .finish()
    }
}
