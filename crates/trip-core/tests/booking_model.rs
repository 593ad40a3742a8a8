use trip_core::limits::{MAX_AGE, NAME_LEN};
use trip_core::{BookingMessage, ControlSignal, Guest, Ledger, TripOffer, ValidationError};
use trip_protocol::text_codec::format_summary;

fn guest(age: u32) -> Guest {
    Guest {
        first_name: "Kwame".to_string(),
        last_name: "Mensah".to_string(),
        age,
        address: "4 Ring Road, Accra".to_string(),
    }
}

#[test]
fn offers_need_a_name_and_a_positive_price() {
    assert!(TripOffer::new("Lagos", 120.0).is_ok());
    assert_eq!(
        TripOffer::new("", 10.0),
        Err(ValidationError::Empty("trip name"))
    );
    assert_eq!(TripOffer::new("Lagos", 0.0), Err(ValidationError::Price(0.0)));
    assert!(TripOffer::new("Lagos", f64::NAN).is_err());
    assert!(matches!(
        TripOffer::new("x".repeat(NAME_LEN + 1), 1.0),
        Err(ValidationError::TooLong { max: NAME_LEN, .. })
    ));
}

#[test]
fn booking_total_is_unit_price_times_party() {
    let offer = TripOffer::new("Nairobi", 50.0).unwrap();
    let msg = BookingMessage::booking(guest(30), &offer, 4).unwrap();

    assert_eq!(msg.client_id, 0);
    assert_eq!(msg.destination, "Nairobi");
    assert_eq!(msg.total_price, 200.0);
    assert!(msg.is_booking());
}

#[test]
fn booking_rejects_bad_age_and_party() {
    let offer = TripOffer::new("Nairobi", 50.0).unwrap();

    assert_eq!(
        BookingMessage::booking(guest(0), &offer, 1),
        Err(ValidationError::AgeOutOfRange(0))
    );
    assert_eq!(
        BookingMessage::booking(guest(MAX_AGE + 1), &offer, 1),
        Err(ValidationError::AgeOutOfRange(MAX_AGE + 1))
    );
    assert!(BookingMessage::booking(guest(MAX_AGE), &offer, 1).is_ok());
    assert_eq!(
        BookingMessage::booking(guest(20), &offer, 0),
        Err(ValidationError::PartySize(0))
    );
}

#[test]
fn retiring_an_offer_keeps_it_valid_but_inactive() {
    let offer = TripOffer::new("Cairo", 80.0).unwrap().retired();
    assert!(!offer.active);
    assert!(offer.validate().is_ok());
}

#[test]
fn control_signals_round_trip_through_wire_values() {
    for signal in [
        ControlSignal::None,
        ControlSignal::Terminate,
        ControlSignal::RequestSummary,
    ] {
        assert_eq!(ControlSignal::from_u8(signal.as_u8()), Some(signal));
    }
    assert_eq!(ControlSignal::from_u8(3), None);
}

#[test]
fn ledger_counts_only_bookings() {
    let offer = TripOffer::new("Nairobi", 50.0).unwrap();
    let booking = BookingMessage::booking(guest(30), &offer, 4).unwrap();

    let mut ledger = Ledger::new();
    assert!(ledger.record(&booking));
    assert!(!ledger.record(&BookingMessage::request_summary()));
    assert!(!ledger.record(&BookingMessage::request_summary()));
    assert!(!ledger.record(&BookingMessage::terminate()));

    assert_eq!(ledger.record_count, 1);
    assert_eq!(ledger.total_revenue, 200.0);
    assert_eq!(format_summary(&ledger), "Records: 1 | Total: $200.00");
}
