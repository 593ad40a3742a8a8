//! trip-core
//!
//! Pure booking logic:
//! - field limits shared by every layer
//! - trip offers (catalog entries)
//! - booking messages and control signals
//! - the server-side ledger

pub mod limits;
pub mod control_signal;
pub mod offer;
pub mod messages;
pub mod ledger;
pub mod error;

pub use control_signal::ControlSignal;
pub use offer::TripOffer;
pub use messages::{BookingMessage, Guest};
pub use ledger::Ledger;
pub use error::ValidationError;
