//! Operator-facing text formats.
//!
//! The server prints one line per accepted booking and a summary block
//! on request or shutdown; the catalog tools print one line per offer.
//!
//! - Booking:
//!   `Client<id> | <first> <last> | Age:<age> | <address> | <destination> | People:<n> | $<total>`
//!
//! - Summary:
//!   `Records: <count> | Total: $<revenue>`
//!
//! - Offer:
//!   `<slot>. <name> - $<price>`

use trip_core::{BookingMessage, Ledger, TripOffer};

/// One line describing an accepted booking.
pub fn format_booking(msg: &BookingMessage) -> String {
    format!(
        "Client{} | {} {} | Age:{} | {} | {} | People:{} | ${:.2}",
        msg.client_id,
        msg.first_name,
        msg.last_name,
        msg.age,
        msg.address,
        msg.destination,
        msg.party_size,
        msg.total_price
    )
}

/// One line with the ledger totals.
pub fn format_summary(ledger: &Ledger) -> String {
    format!(
        "Records: {} | Total: ${:.2}",
        ledger.record_count, ledger.total_revenue
    )
}

/// One catalog line; `slot` is the 1-based slot number.
pub fn format_offer(slot: usize, offer: &TripOffer) -> String {
    format!("{}. {} - ${:.2}", slot, offer.name, offer.price)
}
