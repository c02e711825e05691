//! Routing priority configuration.

use strum::IntoEnumIterator;

use crate::handler::HandlerKind;

/// Order in which handler kinds are consulted, plus the fallback kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingPolicy {
    order: Vec<HandlerKind>,
    fallback: Option<HandlerKind>,
}

impl RoutingPolicy {
    /// Creates a policy consulting `order` first to last.
    ///
    /// Duplicate kinds are ignored after their first occurrence.
    #[must_use]
    pub fn new<I>(order: I, fallback: Option<HandlerKind>) -> Self
    where
        I: IntoIterator<Item = HandlerKind>,
    {
        let mut ordered = Vec::new();
        for kind in order {
            if !ordered.contains(&kind) {
                ordered.push(kind);
            }
        }
        Self {
            order: ordered,
            fallback,
        }
    }

    /// Replaces the fallback kind.
    #[must_use]
    pub fn with_fallback(mut self, fallback: Option<HandlerKind>) -> Self {
        self.fallback = fallback;
        self
    }

    /// Kinds consulted by `matches`, highest priority first.
    #[must_use]
    pub fn order(&self) -> &[HandlerKind] {
        &self.order
    }

    /// Kind receiving messages no handler matched.
    #[must_use]
    pub fn fallback(&self) -> Option<HandlerKind> {
        self.fallback
    }

    pub(super) fn rank(&self, kind: HandlerKind) -> usize {
        self.order
            .iter()
            .position(|candidate| *candidate == kind)
            .unwrap_or(self.order.len())
    }
}

impl Default for RoutingPolicy {
    fn default() -> Self {
        Self::new(HandlerKind::iter(), Some(HandlerKind::Main))
    }
}
