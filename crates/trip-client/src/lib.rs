//! trip-client
//!
//! The booking side of the demo: read the shared catalog, build a
//! booking against a chosen slot and send it to the server.
//!
//! - [`booking`] : catalog reads and message construction
//! - [`network`] : the write-only connection to the server
//! - [`session`] : the list / book / summary flows used by the binary

pub mod booking;
pub mod network;
pub mod session;

pub use booking::{BookingError, Selection};
pub use network::BookingConnection;

/// Default address of the booking server.
pub const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:8888";
