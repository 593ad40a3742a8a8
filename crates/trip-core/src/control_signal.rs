//! Control signals multiplexed into the booking record.

/// Out-of-band instruction carried by a [`BookingMessage`](crate::BookingMessage).
///
/// `None` marks a bookable record; the other two variants carry no
/// payload and their remaining fields are zero.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum ControlSignal {
    /// A normal booking.
    #[default]
    None,

    /// Stop processing this connection and close it.
    Terminate,

    /// Emit the current ledger and keep going.
    RequestSummary,
}

impl ControlSignal {
    /// Wire value of the signal.
    pub fn as_u8(self) -> u8 {
        match self {
            ControlSignal::None => 0,
            ControlSignal::Terminate => 1,
            ControlSignal::RequestSummary => 2,
        }
    }

    /// Parse a wire value; unknown values yield `None`.
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(ControlSignal::None),
            1 => Some(ControlSignal::Terminate),
            2 => Some(ControlSignal::RequestSummary),
            _ => None,
        }
    }

    /// `true` for records that carry a booking.
    pub fn is_booking(self) -> bool {
        self == ControlSignal::None
    }
}
