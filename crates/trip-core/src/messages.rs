//! Booking messages exchanged between client and server.
//!
//! These are **transport-agnostic** logical messages; the fixed-size
//! binary record lives in the `trip-protocol` crate.
//!
//! A [`BookingMessage`] is built client-side for one booking attempt,
//! sent once, and consumed exactly once by a server handler.

use crate::control_signal::ControlSignal;
use crate::error::{check_price, check_text, ValidationError};
use crate::limits::{ADDRESS_LEN, MAX_AGE, MIN_AGE, MIN_PARTY_SIZE, NAME_LEN};
use crate::offer::TripOffer;

/// Who is travelling: the personal part of a booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guest {
    pub first_name: String,
    pub last_name: String,
    pub age: u32,
    pub address: String,
}

impl Guest {
    /// Validate field lengths and the age range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_person(&self.first_name, &self.last_name, self.age, &self.address)
    }
}

/// One record on the booking connection.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingMessage {
    /// Assigned by the server per connection; clients send `0`.
    pub client_id: u32,

    pub first_name: String,
    pub last_name: String,

    /// Traveller age, `MIN_AGE..=MAX_AGE` for bookings.
    pub age: u32,

    pub address: String,

    /// Name of the catalog offer that was booked.
    pub destination: String,

    /// Number of travellers, at least `MIN_PARTY_SIZE`.
    pub party_size: u32,

    /// Unit price times `party_size`.
    pub total_price: f64,

    pub control_signal: ControlSignal,
}

impl BookingMessage {
    /// Build a bookable record for `guest` travelling to `offer`.
    ///
    /// The client id is left at `0`; the server stamps its own.
    pub fn booking(
        guest: Guest,
        offer: &TripOffer,
        party_size: u32,
    ) -> Result<Self, ValidationError> {
        offer.validate()?;

        let msg = BookingMessage {
            client_id: 0,
            first_name: guest.first_name,
            last_name: guest.last_name,
            age: guest.age,
            address: guest.address,
            destination: offer.name.clone(),
            party_size,
            total_price: offer.total_for(party_size),
            control_signal: ControlSignal::None,
        };
        msg.validate()?;
        Ok(msg)
    }

    /// A zero-payload record carrying only `signal`.
    pub fn control(signal: ControlSignal) -> Self {
        BookingMessage {
            client_id: 0,
            first_name: String::new(),
            last_name: String::new(),
            age: 0,
            address: String::new(),
            destination: String::new(),
            party_size: 0,
            total_price: 0.0,
            control_signal: signal,
        }
    }

    /// Convenience for `control(ControlSignal::Terminate)`.
    pub fn terminate() -> Self {
        Self::control(ControlSignal::Terminate)
    }

    /// Convenience for `control(ControlSignal::RequestSummary)`.
    pub fn request_summary() -> Self {
        Self::control(ControlSignal::RequestSummary)
    }

    /// `true` when this record should be entered in the ledger.
    pub fn is_booking(&self) -> bool {
        self.control_signal.is_booking()
    }

    /// Check booking invariants; control records always pass.
    pub fn validate(&self) -> Result<(), ValidationError> {
        // Control records carry no payload semantics.
        if !self.is_booking() {
            return Ok(());
        }

        check_person(&self.first_name, &self.last_name, self.age, &self.address)?;
        check_text("destination", &self.destination, NAME_LEN)?;
        if self.party_size < MIN_PARTY_SIZE {
            return Err(ValidationError::PartySize(self.party_size));
        }
        check_price(self.total_price)
    }
}

fn check_person(
    first_name: &str,
    last_name: &str,
    age: u32,
    address: &str,
) -> Result<(), ValidationError> {
    check_text("first name", first_name, NAME_LEN)?;
    check_text("last name", last_name, NAME_LEN)?;
    check_text("address", address, ADDRESS_LEN)?;
    if !(MIN_AGE..=MAX_AGE).contains(&age) {
        return Err(ValidationError::AgeOutOfRange(age));
    }
    Ok(())
}
