//! Correlation of blocking requests with their replies.
//!
//! The legacy protocol carries no correlation ids, so a blocking caller
//! simply claims the next inbound message. The bridge allows at most one such
//! caller per connection and gives the receive loop first refusal on every
//! message: a claimed message never reaches the router.
//!
//! A reply that arrives after its caller gave up is routed like any push.

mod errors;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::debug;

use crate::codec::Message;
use crate::command::Command;
use crate::transport::{CommandSink, TransportError};

pub use self::errors::BridgeError;

const BRIDGE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::bridge");

enum Delivery {
    Reply(Message),
    Cancelled,
}

struct PendingWait {
    id: u64,
    sender: SyncSender<Delivery>,
}

#[derive(Default)]
struct WaitSlot {
    pending: Option<PendingWait>,
    closed: bool,
}

/// Pairs blocking callers with the next inbound message.
pub struct CorrelationBridge {
    sink: Arc<dyn CommandSink>,
    slot: Mutex<WaitSlot>,
    next_id: AtomicU64,
}

impl CorrelationBridge {
    /// Creates a bridge writing through `sink`.
    #[must_use]
    pub fn new(sink: Arc<dyn CommandSink>) -> Self {
        Self {
            sink,
            slot: Mutex::new(WaitSlot::default()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Sends `command` without waiting; any reply is routed as a push.
    ///
    /// # Errors
    ///
    /// Propagates the [`TransportError`] raised by the sink.
    pub fn send(&self, command: &Command) -> Result<(), TransportError> {
        self.sink.send(command)
    }

    /// Sends `command` and blocks until the next inbound message or
    /// `timeout`.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::ConnectionClosed`] once the bridge is cancelled, or
    ///   when the connection is lost while waiting.
    /// - [`BridgeError::Busy`] when another caller is already waiting.
    /// - [`BridgeError::Send`] when the command cannot be written.
    /// - [`BridgeError::Timeout`] when nothing arrives in time.
    pub fn send_and_wait(
        &self,
        command: &Command,
        timeout: Duration,
    ) -> Result<Message, BridgeError> {
        let (id, receiver) = self.install()?;

        if let Err(error) = self.sink.send(command) {
            self.withdraw(id);
            return Err(BridgeError::from(error));
        }

        match receiver.recv_timeout(timeout) {
            Ok(delivery) => delivery.into_result(),
            Err(RecvTimeoutError::Timeout) => self.expire(id, &receiver, timeout),
            Err(RecvTimeoutError::Disconnected) => Err(BridgeError::ConnectionClosed),
        }
    }

    /// Offers an inbound message to the outstanding waiter.
    ///
    /// Returns `None` when a waiter claimed the message, or hands the message
    /// back for routing.
    pub fn offer(&self, message: Message) -> Option<Message> {
        let mut slot = self.lock_slot();
        let Some(pending) = slot.pending.take() else {
            return Some(message);
        };
        match pending.sender.try_send(Delivery::Reply(message)) {
            Ok(()) => {
                debug!(
                    target: BRIDGE_TARGET,
                    wait_id = pending.id,
                    "reply handed to waiting caller"
                );
                None
            }
            Err(TrySendError::Full(delivery) | TrySendError::Disconnected(delivery)) => {
                match delivery {
                    Delivery::Reply(message) => Some(message),
                    Delivery::Cancelled => None,
                }
            }
        }
    }

    /// Fails the outstanding waiter, if any, with
    /// [`BridgeError::ConnectionClosed`] and rejects all later waits.
    pub fn cancel(&self) {
        let mut slot = self.lock_slot();
        slot.closed = true;
        if let Some(pending) = slot.pending.take() {
            debug!(
                target: BRIDGE_TARGET,
                wait_id = pending.id,
                "cancelling waiting caller"
            );
            let _ = pending.sender.try_send(Delivery::Cancelled);
        }
    }

    /// Returns `true` while a caller is blocked in
    /// [`send_and_wait`](Self::send_and_wait).
    #[must_use]
    pub fn is_waiting(&self) -> bool {
        self.lock_slot().pending.is_some()
    }

    fn install(&self) -> Result<(u64, Receiver<Delivery>), BridgeError> {
        let mut slot = self.lock_slot();
        if slot.closed {
            return Err(BridgeError::ConnectionClosed);
        }
        if slot.pending.is_some() {
            return Err(BridgeError::Busy);
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::sync_channel(1);
        slot.pending = Some(PendingWait { id, sender });
        Ok((id, receiver))
    }

    /// Removes the waiter `id` if it is still installed.
    fn withdraw(&self, id: u64) -> bool {
        let mut slot = self.lock_slot();
        if slot.pending.as_ref().is_some_and(|pending| pending.id == id) {
            slot.pending = None;
            return true;
        }
        false
    }

    fn expire(
        &self,
        id: u64,
        receiver: &Receiver<Delivery>,
        timeout: Duration,
    ) -> Result<Message, BridgeError> {
        if self.withdraw(id) {
            debug!(
                target: BRIDGE_TARGET,
                wait_id = id,
                timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                "reply wait timed out"
            );
            return Err(BridgeError::Timeout { timeout });
        }
        // The waiter was claimed under the slot lock, so the delivery is
        // already in the channel.
        receiver
            .try_recv()
            .map_or(Err(BridgeError::ConnectionClosed), Delivery::into_result)
    }

    fn lock_slot(&self) -> MutexGuard<'_, WaitSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Delivery {
    fn into_result(self) -> Result<Message, BridgeError> {
        match self {
            Self::Reply(message) => Ok(message),
            Self::Cancelled => Err(BridgeError::ConnectionClosed),
        }
    }
}
