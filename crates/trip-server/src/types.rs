//! Shared types for the booking server.
//!
//! This module defines:
//! - `ClientId`: the server-assigned identifier of a connection
//! - `LedgerRequest` and its channel aliases: connection tasks → ledger task
//! - `ServerContext`: what every connection handler is given

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use tokio::sync::{mpsc, oneshot};
use trip_core::{BookingMessage, Ledger};

use crate::ledger_task::LedgerHandle;

/// Identifier for a connected client.
///
/// Unique for the lifetime of the process; stamped into every booking the
/// connection sends, whatever the client put there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(pub u32);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Message flowing from a connection task into the ledger task.
#[derive(Debug)]
pub enum LedgerRequest {
    /// Enter a stamped booking; the reply carries the updated totals.
    Record {
        booking: BookingMessage,
        reply: oneshot::Sender<Ledger>,
    },
    /// A client asked for the summary: print it and reply with it.
    Summary {
        client_id: ClientId,
        reply: oneshot::Sender<Ledger>,
    },
    /// Read the totals without printing anything.
    Snapshot { reply: oneshot::Sender<Ledger> },
    /// The most recently recorded booking, as stamped.
    LastBooking {
        reply: oneshot::Sender<Option<BookingMessage>>,
    },
}

/// Channel from connections → ledger task.
pub type LedgerTx = mpsc::UnboundedSender<LedgerRequest>;
pub type LedgerRx = mpsc::UnboundedReceiver<LedgerRequest>;

/// State shared by the acceptor and every connection handler.
#[derive(Debug)]
pub struct ServerContext {
    ledger: LedgerHandle,
    next_client_id: AtomicU32,
}

impl ServerContext {
    /// Start a fresh ledger task. Must be called inside a Tokio runtime.
    pub fn new() -> Self {
        Self::with_first_client_id(1)
    }

    /// Like [`new`](Self::new), handing out identifiers from `first`.
    pub fn with_first_client_id(first: u32) -> Self {
        ServerContext {
            ledger: LedgerHandle::spawn(),
            next_client_id: AtomicU32::new(first),
        }
    }

    /// Assign the next connection identifier.
    ///
    /// `None` once `u32::MAX` has been handed out: identifiers never wrap,
    /// so 0 (the unset value) is never assigned.
    pub fn next_client_id(&self) -> Option<ClientId> {
        self.next_client_id
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |id| {
                if id == 0 {
                    None
                } else {
                    Some(id.checked_add(1).unwrap_or(0))
                }
            })
            .ok()
            .map(ClientId)
    }

    pub fn ledger(&self) -> &LedgerHandle {
        &self.ledger
    }
}

impl Default for ServerContext {
    fn default() -> Self {
        Self::new()
    }
}
