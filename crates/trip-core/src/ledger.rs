//! Running totals of accepted bookings.

use crate::messages::BookingMessage;

/// Server-resident count and revenue of accepted bookings.
///
/// Only grows. Reading it (summary requests, shutdown) never resets it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Ledger {
    pub record_count: u64,
    pub total_revenue: f64,
}

impl Ledger {
    pub fn new() -> Self {
        Ledger::default()
    }

    /// Enter a booking. Control records are ignored and return `false`.
    pub fn record(&mut self, msg: &BookingMessage) -> bool {
        if !msg.is_booking() {
            return false;
        }
        self.record_count += 1;
        self.total_revenue += msg.total_price;
        true
    }
}
