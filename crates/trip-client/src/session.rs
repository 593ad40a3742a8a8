//! The flows behind each `trip-client` subcommand.
//!
//! Every flow attaches the catalog before touching the network, so a
//! missing catalog fails fast and no connection is ever opened.

use anyhow::Result;
use tracing::info;
use trip_catalog::CatalogKey;
use trip_core::{BookingMessage, Guest, TripOffer};

use crate::booking::Selection;
use crate::network::BookingConnection;

/// What to book.
#[derive(Debug, Clone)]
pub struct BookRequest {
    pub guest: Guest,
    /// 1-based catalog slot.
    pub slot: usize,
    pub party_size: u32,
    /// Ask for the ledger summary after the booking.
    pub then_summary: bool,
}

/// Active offers, for display.
pub fn list(key: &CatalogKey) -> Result<Vec<(usize, TripOffer)>> {
    let selection = Selection::attach(key)?;
    let offers = selection.offers()?;
    selection.detach();
    Ok(offers)
}

/// Validate the choice against the catalog, send the booking, end the
/// session with `TERMINATE`. Returns the message that was sent.
pub async fn book(key: &CatalogKey, server_addr: &str, request: BookRequest) -> Result<BookingMessage> {
    let selection = Selection::attach(key)?;
    let msg = selection.book(request.guest, request.slot, request.party_size)?;
    selection.detach();

    let mut conn = BookingConnection::connect(server_addr).await?;
    conn.send(&msg).await?;
    info!(
        destination = %msg.destination,
        party = msg.party_size,
        total = msg.total_price,
        "booking sent"
    );
    if request.then_summary {
        conn.request_summary().await?;
    }
    conn.terminate().await?;
    Ok(msg)
}

/// Ask the server to print its ledger, then end the session.
pub async fn summary(key: &CatalogKey, server_addr: &str) -> Result<()> {
    Selection::attach(key)?.detach();

    let mut conn = BookingConnection::connect(server_addr).await?;
    conn.request_summary().await?;
    conn.terminate().await?;
    Ok(())
}
