//! Client messaging core for the reservation server protocol.
//!
//! A single duplex connection carries three kinds of traffic: pushes routed
//! to whichever screen is active, synchronous request/response pairs awaited
//! by a blocking caller, and unsolicited notifications. This crate provides
//! the pieces that keep those flows apart:
//!
//! - [`codec`] and [`command`] describe the line protocol.
//! - [`transport`] owns the socket and the background receive thread.
//! - [`bridge`] pairs a blocking caller with the next inbound message.
//! - [`router`] delivers everything else to the registered [`ScreenHandler`]
//!   for the first matching [`HandlerKind`], on the [`ui`] thread.
//! - [`Session`] wires them together from a [`tablelink_config::Config`].
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use tablelink::{Command, HandlerKind, Message, PrefixHandler, Session, TagPrefixes, UiLoop};
//! use tablelink_config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (ui_loop, ui) = UiLoop::new();
//! let session = Session::connect(&Config::default(), Arc::new(ui))?;
//! session.router().register(
//!     HandlerKind::Main,
//!     Arc::new(PrefixHandler::new(TagPrefixes::any(), |message: Message| {
//!         println!("{}", message.to_line());
//!     })),
//! );
//! let reply = session.send_and_wait(&Command::fields("GET_BILL", &["RES1"])?)?;
//! println!("{}", reply.tag());
//! session.logout()?;
//! ui_loop.run_pending();
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod codec;
pub mod command;
pub mod handler;
pub mod router;
pub mod session;
pub mod telemetry;
pub mod transport;
pub mod ui;

pub use bridge::{BridgeError, CorrelationBridge};
pub use codec::{CodecError, Message, Record};
pub use command::{Command, CommandError};
pub use handler::{HandlerKind, PrefixHandler, ScreenHandler, TagPrefixes};
pub use router::{DispatchRouter, RoutingPolicy};
pub use session::{DisconnectHook, Session, SessionBuilder, SessionError};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::{DisconnectCause, Transport, TransportError, TransportOptions};
pub use ui::{UiContext, UiHandle, UiJob, UiLoop};

#[cfg(test)]
mod tests;
