//! Session facade wiring transport, bridge and router together.
//!
//! Every inbound line travels the same path: the codec decodes it (malformed
//! lines are logged and dropped), the [`CorrelationBridge`] gets first
//! refusal on behalf of a blocked caller, and whatever it declines is handed
//! to the [`DispatchRouter`].

use std::sync::Arc;
use std::time::Duration;

use tablelink_config::Config;
use thiserror::Error;
use tracing::{info, warn};

use crate::bridge::{BridgeError, CorrelationBridge};
use crate::codec::{self, Message};
use crate::command::Command;
use crate::router::{DispatchRouter, RoutingPolicy};
use crate::transport::{DisconnectCause, LineSink, Transport, TransportError, TransportOptions};
use crate::ui::UiContext;

const SESSION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::session");

/// Callback run on the UI context when the server connection is lost.
pub type DisconnectHook = Arc<dyn Fn(&DisconnectCause) + Send + Sync>;

/// Errors surfaced by [`Session`] operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Connecting or writing failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// A blocking round trip failed.
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

/// Builder for [`Session`].
pub struct SessionBuilder {
    config: Config,
    policy: RoutingPolicy,
    on_disconnect: Option<DisconnectHook>,
}

impl SessionBuilder {
    /// Starts a builder from `config`.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            policy: RoutingPolicy::default(),
            on_disconnect: None,
        }
    }

    /// Uses `policy` instead of the default routing order.
    #[must_use]
    pub fn routing_policy(mut self, policy: RoutingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Runs `hook` once, on the UI context, if the server drops the
    /// connection. A local close does not trigger it.
    #[must_use]
    pub fn on_disconnect<F>(mut self, hook: F) -> Self
    where
        F: Fn(&DisconnectCause) + Send + Sync + 'static,
    {
        self.on_disconnect = Some(Arc::new(hook));
        self
    }

    /// Connects to the configured server and starts receiving.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Transport`] when the connection cannot be
    /// established or the receive thread cannot be started.
    pub fn connect(self, ui: Arc<dyn UiContext>) -> Result<Session, SessionError> {
        let transport = Arc::new(Transport::connect(
            self.config.server(),
            TransportOptions::from_config(&self.config),
        )?);
        let bridge = Arc::new(CorrelationBridge::new(transport.clone()));
        let router = Arc::new(DispatchRouter::with_policy(Arc::clone(&ui), self.policy));

        let inbound = Inbound {
            bridge: Arc::clone(&bridge),
            router: Arc::clone(&router),
            ui,
            on_disconnect: self.on_disconnect,
        };
        if let Err(error) = transport.start(Arc::new(inbound)) {
            transport.close();
            return Err(error.into());
        }

        info!(
            target: SESSION_TARGET,
            endpoint = transport.endpoint(),
            "session established"
        );
        Ok(Session {
            transport,
            bridge,
            router,
            reply_timeout: self.config.reply_timeout(),
        })
    }
}

/// A live client session over one server connection.
pub struct Session {
    transport: Arc<Transport>,
    bridge: Arc<CorrelationBridge>,
    router: Arc<DispatchRouter>,
    reply_timeout: Duration,
}

impl Session {
    /// Connects with the default routing policy and no disconnect hook.
    ///
    /// # Errors
    ///
    /// See [`SessionBuilder::connect`].
    pub fn connect(config: &Config, ui: Arc<dyn UiContext>) -> Result<Self, SessionError> {
        SessionBuilder::new(config.clone()).connect(ui)
    }

    /// Sends `command` without waiting for a reply.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Transport`] if the write fails or the session
    /// is closed.
    pub fn send(&self, command: &Command) -> Result<(), SessionError> {
        self.bridge.send(command).map_err(SessionError::from)
    }

    /// Sends `command` and waits for the next inbound message, up to the
    /// configured reply timeout.
    ///
    /// Blocks the calling thread. Do not call it from the UI thread: routed
    /// pushes and the disconnect hook cannot run there until it returns.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Bridge`] on timeout, contention, write failure
    /// or connection loss.
    pub fn send_and_wait(&self, command: &Command) -> Result<Message, SessionError> {
        self.send_and_wait_for(command, self.reply_timeout)
    }

    /// Like [`send_and_wait`](Self::send_and_wait) with an explicit timeout.
    ///
    /// # Errors
    ///
    /// See [`send_and_wait`](Self::send_and_wait).
    pub fn send_and_wait_for(
        &self,
        command: &Command,
        timeout: Duration,
    ) -> Result<Message, SessionError> {
        self.bridge
            .send_and_wait(command, timeout)
            .map_err(SessionError::from)
    }

    /// Router used to register screen handlers.
    #[must_use]
    pub fn router(&self) -> &DispatchRouter {
        &self.router
    }

    /// Returns `true` until the session is closed or the connection drops.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.transport.is_open()
    }

    /// Closes the connection and fails any pending round trip with
    /// [`BridgeError::ConnectionClosed`]. Idempotent.
    pub fn close(&self) {
        self.bridge.cancel();
        self.transport.close();
        if let Err(error) = self.transport.join_receiver() {
            warn!(
                target: SESSION_TARGET,
                error = %error,
                "receive thread ended abnormally"
            );
        }
    }

    /// Sends `LOGOUT` and closes the session. The session is closed even
    /// when the command cannot be sent.
    ///
    /// # Errors
    ///
    /// Returns the send failure, if any.
    pub fn logout(&self) -> Result<(), SessionError> {
        let result = self.send(&Command::logout());
        self.close();
        result
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

struct Inbound {
    bridge: Arc<CorrelationBridge>,
    router: Arc<DispatchRouter>,
    ui: Arc<dyn UiContext>,
    on_disconnect: Option<DisconnectHook>,
}

impl LineSink for Inbound {
    fn on_line(&self, line: &str) {
        let message = match codec::decode(line) {
            Ok(message) => message,
            Err(error) => {
                warn!(
                    target: SESSION_TARGET,
                    error = %error,
                    line,
                    "dropping malformed line"
                );
                return;
            }
        };
        if let Some(unclaimed) = self.bridge.offer(message) {
            self.router.dispatch(unclaimed);
        }
    }

    fn on_disconnect(&self, cause: &DisconnectCause) {
        self.bridge.cancel();
        if let Some(hook) = &self.on_disconnect {
            let hook = Arc::clone(hook);
            let cause = cause.clone();
            self.ui.post(Box::new(move || hook(&cause)));
        }
    }
}
