//! Active handler bookkeeping.

use std::collections::HashMap;
use std::sync::Arc;

use crate::handler::{HandlerKind, ScreenHandler};

/// A registered handler tagged with the registration it came from.
#[derive(Clone)]
pub(super) struct Registration {
    pub(super) generation: u64,
    pub(super) handler: Arc<dyn ScreenHandler>,
}

/// At most one handler per kind. A missing entry means "no handler".
#[derive(Default)]
pub(super) struct Registry {
    entries: HashMap<HandlerKind, Registration>,
    next_generation: u64,
}

impl Registry {
    pub(super) fn insert(
        &mut self,
        kind: HandlerKind,
        handler: Arc<dyn ScreenHandler>,
    ) -> Option<Arc<dyn ScreenHandler>> {
        self.next_generation += 1;
        let registration = Registration {
            generation: self.next_generation,
            handler,
        };
        self.entries
            .insert(kind, registration)
            .map(|previous| previous.handler)
    }

    pub(super) fn remove(&mut self, kind: HandlerKind) -> Option<Arc<dyn ScreenHandler>> {
        self.entries.remove(&kind).map(|previous| previous.handler)
    }

    pub(super) fn snapshot(&self) -> HashMap<HandlerKind, Registration> {
        self.entries.clone()
    }

    /// Returns `true` while `generation` is still the live registration of
    /// `kind`.
    pub(super) fn is_current(&self, kind: HandlerKind, generation: u64) -> bool {
        self.entries
            .get(&kind)
            .is_some_and(|registration| registration.generation == generation)
    }

    pub(super) fn kinds(&self) -> impl Iterator<Item = HandlerKind> + '_ {
        self.entries.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::codec::Message;

    struct Silent;

    impl ScreenHandler for Silent {
        fn matches(&self, _tag: &str) -> bool {
            false
        }

        fn handle(&self, _message: Message) {}
    }

    #[rstest]
    fn replacement_bumps_generation() {
        let mut registry = Registry::default();
        assert!(registry.insert(HandlerKind::Billing, Arc::new(Silent)).is_none());
        let first = registry
            .snapshot()
            .get(&HandlerKind::Billing)
            .map(|registration| registration.generation)
            .expect("registered");

        let previous = registry.insert(HandlerKind::Billing, Arc::new(Silent));

        assert!(previous.is_some());
        assert!(!registry.is_current(HandlerKind::Billing, first));
        assert!(registry.is_current(HandlerKind::Billing, first + 1));
    }

    #[rstest]
    fn removal_clears_entry() {
        let mut registry = Registry::default();
        registry.insert(HandlerKind::Main, Arc::new(Silent));

        assert!(registry.remove(HandlerKind::Main).is_some());
        assert!(registry.remove(HandlerKind::Main).is_none());
        assert!(!registry.is_current(HandlerKind::Main, 1));
        assert_eq!(registry.kinds().count(), 0);
    }
}
