//! Dispatch of pushed messages to the active screen.
//!
//! The router owns the registry of active handlers. For every message it
//! consults the handlers in policy order and delivers to the first one whose
//! `matches` accepts the tag, falling back to the policy's fallback kind.
//! Messages nobody accepts are dropped. Delivery always happens on the UI
//! context, never on the caller's thread.

mod policy;
mod registry;

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::codec::Message;
use crate::handler::{HandlerKind, ScreenHandler};
use crate::ui::UiContext;

pub use self::policy::RoutingPolicy;
use self::registry::{Registration, Registry};

/// Tracing target for routing decisions.
pub(crate) const ROUTER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::router");

/// Routes inbound pushes to the active screen handlers.
pub struct DispatchRouter {
    registry: Arc<Mutex<Registry>>,
    policy: RoutingPolicy,
    ui: Arc<dyn UiContext>,
}

impl DispatchRouter {
    /// Creates a router with the default policy.
    #[must_use]
    pub fn new(ui: Arc<dyn UiContext>) -> Self {
        Self::with_policy(ui, RoutingPolicy::default())
    }

    /// Creates a router consulting handlers according to `policy`.
    #[must_use]
    pub fn with_policy(ui: Arc<dyn UiContext>, policy: RoutingPolicy) -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry::default())),
            policy,
            ui,
        }
    }

    /// Makes `handler` the active handler for `kind`, returning the one it
    /// replaces.
    pub fn register(
        &self,
        kind: HandlerKind,
        handler: Arc<dyn ScreenHandler>,
    ) -> Option<Arc<dyn ScreenHandler>> {
        let previous = self.lock_registry().insert(kind, handler);
        debug!(
            target: ROUTER_TARGET,
            kind = %kind,
            replaced = previous.is_some(),
            "handler registered"
        );
        previous
    }

    /// Clears the active handler for `kind`, returning it.
    pub fn unregister(&self, kind: HandlerKind) -> Option<Arc<dyn ScreenHandler>> {
        let previous = self.lock_registry().remove(kind);
        debug!(
            target: ROUTER_TARGET,
            kind = %kind,
            removed = previous.is_some(),
            "handler unregistered"
        );
        previous
    }

    /// Selects a handler for `message` and posts its delivery to the UI
    /// context. Returns the selected kind, or `None` when the message was
    /// dropped.
    ///
    /// Never blocks on the handler itself. A handler replaced or removed
    /// before the delivery runs does not receive the message.
    pub fn dispatch(&self, message: Message) -> Option<HandlerKind> {
        let snapshot = self.lock_registry().snapshot();
        let Some((kind, registration)) = self.select(&snapshot, message.tag()) else {
            debug!(
                target: ROUTER_TARGET,
                tag = message.tag(),
                "unroutable message dropped"
            );
            return None;
        };

        debug!(
            target: ROUTER_TARGET,
            tag = message.tag(),
            kind = %kind,
            "message routed"
        );
        let registry = Arc::clone(&self.registry);
        let Registration {
            generation,
            handler,
        } = registration;
        self.ui.post(Box::new(move || {
            let current = registry
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .is_current(kind, generation);
            if !current {
                debug!(
                    target: ROUTER_TARGET,
                    tag = message.tag(),
                    kind = %kind,
                    "stale handler skipped"
                );
                return;
            }
            handler.handle(message);
        }));
        Some(kind)
    }

    /// Registered kinds, highest priority first.
    #[must_use]
    pub fn active_kinds(&self) -> Vec<HandlerKind> {
        let mut kinds: Vec<HandlerKind> = self.lock_registry().kinds().collect();
        kinds.sort_by_key(|kind| (self.policy.rank(*kind), *kind));
        kinds
    }

    /// Policy this router was built with.
    #[must_use]
    pub fn policy(&self) -> &RoutingPolicy {
        &self.policy
    }

    fn select(
        &self,
        snapshot: &HashMap<HandlerKind, Registration>,
        tag: &str,
    ) -> Option<(HandlerKind, Registration)> {
        let matched = self.policy.order().iter().find_map(|kind| {
            snapshot
                .get(kind)
                .filter(|registration| registration.handler.matches(tag))
                .map(|registration| (*kind, registration.clone()))
        });
        matched.or_else(|| {
            let fallback = self.policy.fallback()?;
            snapshot
                .get(&fallback)
                .map(|registration| (fallback, registration.clone()))
        })
    }

    fn lock_registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for DispatchRouter {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("DispatchRouter")
            .field("policy", &self.policy)
            .field("active", &self.active_kinds())
            .finish_non_exhaustive()
    }
}
