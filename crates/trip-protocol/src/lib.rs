//! trip-protocol
//!
//! Wire-level encoding/decoding for the booking server.
//!
//! This crate is responsible for turning logical booking messages
//! (`trip_core::BookingMessage`) into bytes and back again, and for the
//! human-readable lines the server prints.
//!
//! - [`wire_types`]   : record layout, field widths, version
//! - [`binary_codec`] : fixed-size binary record (client → server)
//! - [`text_codec`]   : operator-facing booking and summary lines

pub mod wire_types;
pub mod binary_codec;
pub mod text_codec;

pub use binary_codec::{decode_booking, encode_booking, encode_record, ProtocolError};
pub use wire_types::RECORD_LEN;
