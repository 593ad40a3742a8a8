//! Write-only connection to the booking server.
//!
//! Every message goes out as exactly one fixed-size record in a single
//! write. The server never answers, so nothing is ever read back.

use std::io;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info};
use trip_core::{BookingMessage, ControlSignal};
use trip_protocol::{encode_record, ProtocolError};

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("cannot connect to {addr}: {source} (is trip-server running?)")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Encode(#[from] ProtocolError),

    #[error("send failed: {0}")]
    Io(#[from] io::Error),
}

pub struct BookingConnection<W> {
    stream: W,
    sent: usize,
}

impl BookingConnection<TcpStream> {
    pub async fn connect(addr: &str) -> Result<Self, SendError> {
        info!("Connecting to {}...", addr);
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|source| SendError::Connect {
                addr: addr.to_string(),
                source,
            })?;
        stream.set_nodelay(true)?;
        info!("Connected");
        Ok(Self::new(stream))
    }
}

impl<W: AsyncWrite + Unpin> BookingConnection<W> {
    pub fn new(stream: W) -> Self {
        BookingConnection { stream, sent: 0 }
    }

    /// Encode and send one record.
    pub async fn send(&mut self, msg: &BookingMessage) -> Result<(), SendError> {
        let record = encode_record(msg)?;
        self.stream.write_all(&record).await?;
        self.stream.flush().await?;
        self.sent += 1;
        debug!(signal = ?msg.control_signal, "record sent");
        Ok(())
    }

    pub async fn send_signal(&mut self, signal: ControlSignal) -> Result<(), SendError> {
        self.send(&BookingMessage::control(signal)).await
    }

    /// Ask the server to print its ledger; the connection stays open.
    pub async fn request_summary(&mut self) -> Result<(), SendError> {
        self.send_signal(ControlSignal::RequestSummary).await
    }

    /// End the session: send `TERMINATE` and close the write side.
    pub async fn terminate(mut self) -> Result<usize, SendError> {
        self.send_signal(ControlSignal::Terminate).await?;
        self.stream.shutdown().await?;
        Ok(self.sent)
    }

    /// Records sent so far, control records included.
    pub fn sent(&self) -> usize {
        self.sent
    }
}
