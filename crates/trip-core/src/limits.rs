//! Field limits and well-known values.
//!
//! Text limits are byte lengths of the UTF-8 encoding, because both the
//! shared catalog slots and the wire record store text in fixed-width
//! byte fields.

/// Maximum length of a trip name, a destination, a first or a last name.
pub const NAME_LEN: usize = 50;

/// Maximum length of a postal address.
pub const ADDRESS_LEN: usize = 100;

/// Youngest accepted traveller.
pub const MIN_AGE: u32 = 1;

/// Oldest accepted traveller.
pub const MAX_AGE: u32 = 150;

/// Smallest party that can be booked.
pub const MIN_PARTY_SIZE: u32 = 1;

/// Default number of slots in a freshly created catalog.
pub const CATALOG_CAPACITY: usize = 10;

/// Largest catalog the manager will create.
pub const MAX_CATALOG_CAPACITY: usize = 4096;

/// Default TCP port of the booking server.
pub const SERVER_PORT: u16 = 8888;
