//! Central ledger loop.
//!
//! This task owns the `Ledger` and processes every `LedgerRequest` coming
//! from connection tasks, one at a time. It is also the only place that
//! prints booking records and summaries, so lines from concurrent
//! connections never interleave.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};
use trip_core::{BookingMessage, Ledger};
use trip_protocol::text_codec::{format_booking, format_summary};

use crate::types::{ClientId, LedgerRequest, LedgerRx, LedgerTx};

/// The ledger task has stopped; nothing can be recorded any more.
#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("ledger task is gone")]
pub struct LedgerClosed;

/// Cheap, cloneable sender side of the ledger task.
#[derive(Debug, Clone)]
pub struct LedgerHandle {
    tx: LedgerTx,
}

impl LedgerHandle {
    /// Spawn the ledger task on the current runtime.
    ///
    /// The task exits once every handle has been dropped.
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_ledger_loop(rx));
        LedgerHandle { tx }
    }

    /// Enter a booking whose `client_id` has already been stamped.
    pub async fn record(&self, booking: BookingMessage) -> Result<Ledger, LedgerClosed> {
        self.request(|reply| LedgerRequest::Record { booking, reply })
            .await
    }

    /// Print the summary on behalf of `client_id` and return it.
    pub async fn summary(&self, client_id: ClientId) -> Result<Ledger, LedgerClosed> {
        self.request(|reply| LedgerRequest::Summary { client_id, reply })
            .await
    }

    /// Current totals, without printing.
    pub async fn snapshot(&self) -> Result<Ledger, LedgerClosed> {
        self.request(|reply| LedgerRequest::Snapshot { reply }).await
    }

    /// The last booking entered, with the `client_id` the server stamped.
    pub async fn last_booking(&self) -> Result<Option<BookingMessage>, LedgerClosed> {
        self.request(|reply| LedgerRequest::LastBooking { reply })
            .await
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> LedgerRequest,
    ) -> Result<T, LedgerClosed> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(make(reply)).map_err(|_| LedgerClosed)?;
        rx.await.map_err(|_| LedgerClosed)
    }
}

/// Run the ledger processing loop.
async fn run_ledger_loop(mut rx: LedgerRx) {
    let mut ledger = Ledger::new();
    let mut last: Option<BookingMessage> = None;

    while let Some(req) = rx.recv().await {
        match req {
            LedgerRequest::Record { booking, reply } => {
                if ledger.record(&booking) {
                    println!("{}", format_booking(&booking));
                    info!(
                        client = booking.client_id,
                        destination = %booking.destination,
                        party = booking.party_size,
                        total = booking.total_price,
                        "booking recorded"
                    );
                    last = Some(booking);
                }
                let _ = reply.send(ledger);
            }
            LedgerRequest::Summary { client_id, reply } => {
                println!("{}", format_summary(&ledger));
                info!(
                    client = %client_id,
                    records = ledger.record_count,
                    revenue = ledger.total_revenue,
                    "summary requested"
                );
                let _ = reply.send(ledger);
            }
            LedgerRequest::Snapshot { reply } => {
                let _ = reply.send(ledger);
            }
            LedgerRequest::LastBooking { reply } => {
                let _ = reply.send(last.clone());
            }
        }
    }

    debug!("ledger loop shutting down (all handles dropped)");
}
