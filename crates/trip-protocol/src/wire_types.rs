//! Low-level wire constants.
//!
//! A booking record is a single fixed-size frame. There is no length
//! prefix and no delimiter: the receiver reads exactly [`RECORD_LEN`]
//! bytes per message. Integers are big-endian; text fields are UTF-8,
//! NUL padded to their fixed width.
//!
//! ```text
//! [0]        version      (u8, PROTOCOL_VERSION)
//! [1]        signal       (u8, 0=none 1=terminate 2=request-summary)
//! [2..4]     reserved = 0
//! [4..8]     client_id    (u32 BE)
//! [8..58]    first_name   (50 bytes)
//! [58..108]  last_name    (50 bytes)
//! [108..112] age          (u32 BE)
//! [112..212] address      (100 bytes)
//! [212..262] destination  (50 bytes)
//! [262..266] party_size   (u32 BE)
//! [266..274] total_price  (f64 bits, u64 BE)
//! ```

use std::ops::Range;

use trip_core::limits::{ADDRESS_LEN, NAME_LEN};

/// Current protocol version.
///
/// Bumped whenever the record layout changes.
pub const PROTOCOL_VERSION: u8 = 1;

pub const VERSION_AT: usize = 0;
pub const SIGNAL_AT: usize = 1;
pub const RESERVED: Range<usize> = 2..4;
pub const CLIENT_ID: Range<usize> = 4..8;
pub const FIRST_NAME: Range<usize> = field(CLIENT_ID.end, NAME_LEN);
pub const LAST_NAME: Range<usize> = field(FIRST_NAME.end, NAME_LEN);
pub const AGE: Range<usize> = field(LAST_NAME.end, 4);
pub const ADDRESS: Range<usize> = field(AGE.end, ADDRESS_LEN);
pub const DESTINATION: Range<usize> = field(ADDRESS.end, NAME_LEN);
pub const PARTY_SIZE: Range<usize> = field(DESTINATION.end, 4);
pub const TOTAL_PRICE: Range<usize> = field(PARTY_SIZE.end, 8);

/// Size of every booking record on the wire.
pub const RECORD_LEN: usize = TOTAL_PRICE.end;

const fn field(start: usize, width: usize) -> Range<usize> {
    start..start + width
}
