//! Screen handler contract.
//!
//! Screens register a handler with the router while they are on display.
//! The router asks each handler whether it accepts a message tag and delivers
//! the message to the first one that does.

use std::fmt;

use strum::{Display, EnumIter, EnumString};

use crate::codec::Message;

/// Class of screen that can receive pushed messages.
///
/// Declaration order is the default routing priority.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum HandlerKind {
    /// Staff-side reservation screen.
    StaffBooking,
    /// Customer self-service reservation screen.
    SelfBooking,
    /// Receipt for a seated table.
    TableReceipt,
    /// Waiting list overview.
    WaitingList,
    /// Bill payment screen.
    Billing,
    /// Administrative detail view.
    AdminDetail,
    /// Main menu; the default fallback.
    Main,
}

/// A screen able to consume pushed messages.
///
/// `handle` is only ever invoked on the UI context's thread.
pub trait ScreenHandler: Send + Sync {
    /// Returns `true` when this screen accepts messages carrying `tag`.
    fn matches(&self, tag: &str) -> bool;

    /// Consumes a routed message.
    fn handle(&self, message: Message);
}

/// Set of tag prefixes a screen owns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagPrefixes {
    prefixes: Vec<String>,
}

impl TagPrefixes {
    /// Builds a matcher from `prefixes`.
    #[must_use]
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// Matcher accepting every tag.
    #[must_use]
    pub fn any() -> Self {
        Self::new([""])
    }

    /// Returns `true` when `tag` starts with one of the prefixes.
    #[must_use]
    pub fn matches(&self, tag: &str) -> bool {
        self.prefixes.iter().any(|prefix| tag.starts_with(prefix.as_str()))
    }
}

/// Handler built from a prefix set and a closure.
pub struct PrefixHandler<F> {
    prefixes: TagPrefixes,
    on_message: F,
}

impl<F> PrefixHandler<F>
where
    F: Fn(Message) + Send + Sync,
{
    /// Creates a handler that passes messages matching `prefixes` to
    /// `on_message`.
    pub fn new(prefixes: TagPrefixes, on_message: F) -> Self {
        Self {
            prefixes,
            on_message,
        }
    }
}

impl<F> ScreenHandler for PrefixHandler<F>
where
    F: Fn(Message) + Send + Sync,
{
    fn matches(&self, tag: &str) -> bool {
        self.prefixes.matches(tag)
    }

    fn handle(&self, message: Message) {
        (self.on_message)(message);
    }
}

impl<F> fmt::Debug for PrefixHandler<F> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("PrefixHandler")
            .field("prefixes", &self.prefixes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use rstest::rstest;
    use strum::IntoEnumIterator;

    use super::*;
    use crate::codec::decode;

    #[rstest]
    fn kinds_iterate_in_priority_order() {
        let kinds: Vec<HandlerKind> = HandlerKind::iter().collect();

        assert_eq!(kinds.first(), Some(&HandlerKind::StaffBooking));
        assert_eq!(kinds.last(), Some(&HandlerKind::Main));
        assert_eq!(kinds.len(), 7);
    }

    #[rstest]
    #[case(HandlerKind::WaitingList, "waiting_list")]
    #[case(HandlerKind::AdminDetail, "admin_detail")]
    fn kinds_render_in_snake_case(#[case] kind: HandlerKind, #[case] expected: &str) {
        assert_eq!(kind.to_string(), expected);
        assert_eq!(expected.parse::<HandlerKind>().expect("parse"), kind);
    }

    #[rstest]
    #[case("BILL", true)]
    #[case("BILL_PAID", true)]
    #[case("PAYMENT_OK", true)]
    #[case("WAITING_LIST", false)]
    fn prefixes_match_tag_starts(#[case] tag: &str, #[case] expected: bool) {
        let prefixes = TagPrefixes::new(["BILL", "PAYMENT"]);

        assert_eq!(prefixes.matches(tag), expected);
    }

    #[rstest]
    fn empty_prefix_set_matches_nothing() {
        assert!(!TagPrefixes::default().matches("OK"));
        assert!(TagPrefixes::any().matches("OK"));
    }

    #[rstest]
    fn prefix_handler_invokes_closure() {
        let seen = Mutex::new(Vec::new());
        let handler = PrefixHandler::new(TagPrefixes::new(["TABLE"]), |message: Message| {
            seen.lock().expect("seen lock").push(message.tag().to_owned());
        });

        assert!(handler.matches("TABLE_UPDATE"));
        handler.handle(decode("TABLE_UPDATE|4|FREE").expect("decode"));

        assert_eq!(*seen.lock().expect("seen lock"), vec!["TABLE_UPDATE"]);
    }
}
