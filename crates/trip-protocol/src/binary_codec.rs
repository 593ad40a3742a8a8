//! Binary encoding/decoding for booking records.
//!
//! This module converts between:
//! - raw fixed-size records (`&[u8]`, see [`wire_types`](crate::wire_types))
//! - high-level `trip_core::BookingMessage`
//!
//! NOTE: This module encodes/decodes **one record per buffer**. A TCP
//! reader is expected to accumulate exactly [`RECORD_LEN`] bytes before
//! calling [`decode_booking`].

use std::ops::Range;

use thiserror::Error;
use trip_core::{BookingMessage, ControlSignal, ValidationError};

use crate::wire_types::{
    ADDRESS, AGE, CLIENT_ID, DESTINATION, FIRST_NAME, LAST_NAME, PARTY_SIZE, PROTOCOL_VERSION,
    RECORD_LEN, RESERVED, SIGNAL_AT, TOTAL_PRICE, VERSION_AT,
};

/// Errors that can arise when encoding/decoding a booking record.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Buffer shorter than a full record.
    #[error("record truncated after {0} bytes")]
    Truncated(usize),

    /// Unsupported or mismatched protocol version.
    #[error("unsupported protocol version {0}")]
    VersionMismatch(u8),

    /// Unknown control signal value.
    #[error("unknown control signal: {0}")]
    UnknownSignal(u8),

    /// Reserved bytes were not zero.
    #[error("reserved bytes must be zero")]
    Reserved,

    /// Text field is not valid UTF-8 or contains a NUL.
    #[error("field {0} is not valid text")]
    InvalidText(&'static str),

    /// Field fails booking validation.
    #[error("invalid record: {0}")]
    Invalid(#[from] ValidationError),
}

// ============================================================================
// Encode: client side
// ============================================================================

/// Encode a message into a fixed-size record.
///
/// The message is validated first, so oversize text or an invalid
/// booking never reaches the wire.
pub fn encode_record(msg: &BookingMessage) -> Result<[u8; RECORD_LEN], ProtocolError> {
    msg.validate()?;

    let mut rec = [0u8; RECORD_LEN];
    rec[VERSION_AT] = PROTOCOL_VERSION;
    rec[SIGNAL_AT] = msg.control_signal.as_u8();

    rec[CLIENT_ID].copy_from_slice(&msg.client_id.to_be_bytes());
    put_text(&mut rec, FIRST_NAME, "first name", &msg.first_name)?;
    put_text(&mut rec, LAST_NAME, "last name", &msg.last_name)?;
    rec[AGE].copy_from_slice(&msg.age.to_be_bytes());
    put_text(&mut rec, ADDRESS, "address", &msg.address)?;
    put_text(&mut rec, DESTINATION, "destination", &msg.destination)?;
    rec[PARTY_SIZE].copy_from_slice(&msg.party_size.to_be_bytes());
    rec[TOTAL_PRICE].copy_from_slice(&msg.total_price.to_bits().to_be_bytes());

    Ok(rec)
}

/// Encode a message, appending the record to `out`.
pub fn encode_booking(msg: &BookingMessage, out: &mut Vec<u8>) -> Result<(), ProtocolError> {
    let rec = encode_record(msg)?;
    out.extend_from_slice(&rec);
    Ok(())
}

// ============================================================================
// Decode: server side
// ============================================================================

/// Decode one record from the front of `buf`.
///
/// Bytes past [`RECORD_LEN`] are ignored. Bookable records are
/// validated; control records only need a known signal value.
pub fn decode_booking(buf: &[u8]) -> Result<BookingMessage, ProtocolError> {
    if buf.len() < RECORD_LEN {
        return Err(ProtocolError::Truncated(buf.len()));
    }

    let version = buf[VERSION_AT];
    if version != PROTOCOL_VERSION {
        return Err(ProtocolError::VersionMismatch(version));
    }

    let signal_raw = buf[SIGNAL_AT];
    let control_signal =
        ControlSignal::from_u8(signal_raw).ok_or(ProtocolError::UnknownSignal(signal_raw))?;

    if buf[RESERVED].iter().any(|&b| b != 0) {
        return Err(ProtocolError::Reserved);
    }

    if !control_signal.is_booking() {
        // Remaining fields are ignored for control records.
        let mut msg = BookingMessage::control(control_signal);
        msg.client_id = read_u32_be(&buf[CLIENT_ID]);
        return Ok(msg);
    }

    let msg = BookingMessage {
        client_id: read_u32_be(&buf[CLIENT_ID]),
        first_name: get_text(buf, FIRST_NAME, "first name")?,
        last_name: get_text(buf, LAST_NAME, "last name")?,
        age: read_u32_be(&buf[AGE]),
        address: get_text(buf, ADDRESS, "address")?,
        destination: get_text(buf, DESTINATION, "destination")?,
        party_size: read_u32_be(&buf[PARTY_SIZE]),
        total_price: f64::from_bits(read_u64_be(&buf[TOTAL_PRICE])),
        control_signal,
    };
    msg.validate()?;

    Ok(msg)
}

// -----------------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------------

fn put_text(
    rec: &mut [u8; RECORD_LEN],
    range: Range<usize>,
    field: &'static str,
    value: &str,
) -> Result<(), ProtocolError> {
    let bytes = value.as_bytes();
    let width = range.len();
    trip_core::error::check_len(field, value, width)?;
    if bytes.contains(&0) {
        return Err(ProtocolError::InvalidText(field));
    }
    rec[range.start..range.start + bytes.len()].copy_from_slice(bytes);
    Ok(())
}

fn get_text(buf: &[u8], range: Range<usize>, field: &'static str) -> Result<String, ProtocolError> {
    let raw = &buf[range];
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    std::str::from_utf8(&raw[..end])
        .map(str::to_owned)
        .map_err(|_| ProtocolError::InvalidText(field))
}

fn read_u32_be(bytes: &[u8]) -> u32 {
    let mut arr = [0u8; 4];
    arr.copy_from_slice(&bytes[..4]);
    u32::from_be_bytes(arr)
}

fn read_u64_be(bytes: &[u8]) -> u64 {
    let mut arr = [0u8; 8];
    arr.copy_from_slice(&bytes[..8]);
    u64::from_be_bytes(arr)
}
