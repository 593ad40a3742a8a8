//! Per-connection handler.
//!
//! A connection carries back-to-back fixed-size records with no other
//! framing. Bytes are accumulated until a whole record is available; a
//! clean close between records ends the session, a close in the middle of
//! one is reported as truncation. The server never writes back.

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info, warn};
use trip_core::ControlSignal;
use trip_protocol::{decode_booking, RECORD_LEN};

use crate::ledger_task::{LedgerClosed, LedgerHandle};
use crate::types::ClientId;

/// How a session ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The client sent `TERMINATE`.
    Terminated,
    /// The client closed the connection at a record boundary.
    Disconnected,
}

#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection closed mid-record ({received} of {expected} bytes)")]
    Truncated { received: usize, expected: usize },

    #[error(transparent)]
    Ledger(#[from] LedgerClosed),
}

/// Splits a byte stream into whole records.
#[derive(Debug)]
pub struct RecordReader<R> {
    inner: R,
    buf: BytesMut,
}

impl<R: AsyncRead + Unpin> RecordReader<R> {
    pub fn new(inner: R) -> Self {
        RecordReader {
            inner,
            buf: BytesMut::with_capacity(RECORD_LEN * 4),
        }
    }

    /// Next complete record, or `None` on a clean close.
    pub async fn next_record(&mut self) -> Result<Option<Bytes>, ConnectionError> {
        loop {
            if self.buf.len() >= RECORD_LEN {
                return Ok(Some(self.buf.split_to(RECORD_LEN).freeze()));
            }
            if self.buf.capacity() - self.buf.len() < RECORD_LEN {
                self.buf.reserve(RECORD_LEN);
            }
            if self.inner.read_buf(&mut self.buf).await? == 0 {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                return Err(ConnectionError::Truncated {
                    received: self.buf.len(),
                    expected: RECORD_LEN,
                });
            }
        }
    }
}

/// Run the read loop for a single connection until it terminates,
/// disconnects or fails.
///
/// Bookings are stamped with `client_id` before they reach the ledger.
/// Records that arrive whole but do not decode are logged and skipped.
pub async fn run_client<S>(
    client_id: ClientId,
    stream: S,
    ledger: &LedgerHandle,
) -> Result<SessionEnd, ConnectionError>
where
    S: AsyncRead + Unpin,
{
    let mut records = RecordReader::new(stream);

    while let Some(frame) = records.next_record().await? {
        let mut msg = match decode_booking(&frame) {
            Ok(msg) => msg,
            Err(err) => {
                warn!(client = %client_id, error = %err, "skipping malformed record");
                continue;
            }
        };

        match msg.control_signal {
            ControlSignal::Terminate => {
                info!(client = %client_id, "client terminated session");
                return Ok(SessionEnd::Terminated);
            }
            ControlSignal::RequestSummary => {
                ledger.summary(client_id).await?;
            }
            ControlSignal::None => {
                msg.client_id = client_id.0;
                let totals = ledger.record(msg).await?;
                debug!(client = %client_id, records = totals.record_count, "ledger updated");
            }
        }
    }

    info!(client = %client_id, "client disconnected");
    Ok(SessionEnd::Disconnected)
}
