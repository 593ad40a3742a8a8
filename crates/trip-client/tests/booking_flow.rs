use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{duplex, AsyncReadExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use trip_catalog::{Catalog, CatalogError, CatalogKey};
use trip_client::session::{self, BookRequest};
use trip_client::{BookingConnection, BookingError, Selection};
use trip_core::{BookingMessage, ControlSignal, Guest, Ledger, TripOffer};
use trip_protocol::{decode_booking, RECORD_LEN};
use trip_server::{server, ServerContext};

static NEXT: AtomicUsize = AtomicUsize::new(0);

/// Catalog under a key unique to this test; removed on drop.
struct TestCatalog {
    key: CatalogKey,
    catalog: Option<Catalog>,
}

impl TestCatalog {
    fn with(offers: &[TripOffer]) -> Self {
        let n = NEXT.fetch_add(1, Ordering::Relaxed);
        let key = CatalogKey::new(format!("tb{}-{}", std::process::id(), n)).unwrap();
        let catalog = Catalog::create(&key, 10).unwrap();
        for offer in offers {
            catalog.append(offer).unwrap();
        }
        TestCatalog {
            key,
            catalog: Some(catalog),
        }
    }
}

impl Drop for TestCatalog {
    fn drop(&mut self) {
        if let Some(catalog) = self.catalog.take() {
            let _ = catalog.destroy();
        }
    }
}

fn guest() -> Guest {
    Guest {
        first_name: "Zawadi".to_string(),
        last_name: "Kamau".to_string(),
        age: 29,
        address: "8 Kenyatta Avenue".to_string(),
    }
}

fn missing_key() -> CatalogKey {
    CatalogKey::new(format!("tb{}-missing", std::process::id())).unwrap()
}

#[test]
fn selection_uses_the_price_read_at_choice_time() {
    let catalog = TestCatalog::with(&[
        TripOffer::new("Lagos", 120.0).unwrap(),
        TripOffer::new("Cairo", 80.0).unwrap().retired(),
    ]);
    let selection = Selection::attach(&catalog.key).unwrap();

    assert_eq!(selection.offers().unwrap().len(), 1);

    let msg = selection.book(guest(), 1, 3).unwrap();
    assert_eq!(msg.destination, "Lagos");
    assert_eq!(msg.total_price, 360.0);
    assert_eq!(msg.client_id, 0);
    assert_eq!(msg.control_signal, ControlSignal::None);

    let err = selection.book(guest(), 2, 1).unwrap_err();
    assert!(matches!(err, BookingError::Catalog(CatalogError::Inactive(2))));
    assert!(!err.is_fatal());
    assert!(matches!(
        selection.book(guest(), 11, 1),
        Err(BookingError::Catalog(CatalogError::OutOfRange { .. }))
    ));
}

#[test]
fn offer_retired_after_listing_is_rejected() {
    let catalog = TestCatalog::with(&[
        TripOffer::new("Lagos", 120.0).unwrap(),
        TripOffer::new("Cairo", 80.0).unwrap(),
    ]);
    let selection = Selection::attach(&catalog.key).unwrap();
    let listed = selection.offers().unwrap();
    assert_eq!(listed[1].1.name, "Cairo");

    catalog.catalog.as_ref().unwrap().deactivate(2).unwrap();

    assert!(matches!(
        selection.choose(2),
        Err(BookingError::Catalog(CatalogError::Inactive(2)))
    ));
}

#[test]
fn invalid_guest_or_party_is_rejected_before_sending() {
    let catalog = TestCatalog::with(&[TripOffer::new("Lagos", 120.0).unwrap()]);
    let selection = Selection::attach(&catalog.key).unwrap();

    let mut old = guest();
    old.age = 151;
    assert!(matches!(
        selection.book(old, 1, 1),
        Err(BookingError::Invalid(_))
    ));
    assert!(matches!(
        selection.book(guest(), 1, 0),
        Err(BookingError::Invalid(_))
    ));
}

#[tokio::test]
async fn connection_writes_one_record_per_message() {
    let (client, mut server) = duplex(4096);
    let mut conn = BookingConnection::new(client);

    let booking = BookingMessage::booking(guest(), &TripOffer::new("Lagos", 120.0).unwrap(), 2).unwrap();
    conn.send(&booking).await.unwrap();
    conn.request_summary().await.unwrap();
    assert_eq!(conn.terminate().await.unwrap(), 3);

    let mut bytes = Vec::new();
    server.read_to_end(&mut bytes).await.unwrap();
    assert_eq!(bytes.len(), 3 * RECORD_LEN);

    let decoded: Vec<BookingMessage> = bytes
        .chunks(RECORD_LEN)
        .map(|record| decode_booking(record).unwrap())
        .collect();
    assert_eq!(decoded[0], booking);
    assert_eq!(decoded[1].control_signal, ControlSignal::RequestSummary);
    assert_eq!(decoded[2].control_signal, ControlSignal::Terminate);
}

#[tokio::test]
async fn missing_catalog_fails_before_connecting() {
    // Nothing listens here: a connection attempt would fail differently.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);

    let request = BookRequest {
        guest: guest(),
        slot: 1,
        party_size: 1,
        then_summary: false,
    };
    let err = session::book(&missing_key(), &addr, request).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BookingError>(),
        Some(BookingError::Catalog(CatalogError::NotFound(_)))
    ));
    assert!(err.to_string().contains("catalog-manager create"));

    let err = session::summary(&missing_key(), &addr).await.unwrap_err();
    assert!(err.downcast_ref::<BookingError>().is_some());
}

#[tokio::test]
async fn booking_reaches_the_server_ledger() {
    let catalog = TestCatalog::with(&[TripOffer::new("Nairobi", 50.0).unwrap()]);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let ctx = Arc::new(ServerContext::new());
    let (stop, stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(server::serve(listener, Arc::clone(&ctx), async move {
        let _ = stopped.await;
    }));

    let request = BookRequest {
        guest: guest(),
        slot: 1,
        party_size: 4,
        then_summary: true,
    };
    let sent = session::book(&catalog.key, &addr, request).await.unwrap();
    assert_eq!(sent.total_price, 200.0);

    session::summary(&catalog.key, &addr).await.unwrap();

    let expected = Ledger {
        record_count: 1,
        total_revenue: 200.0,
    };
    tokio::time::timeout(Duration::from_secs(5), async {
        while ctx.ledger().snapshot().await.unwrap() != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("booking never reached the ledger");

    stop.send(()).unwrap();
    assert_eq!(server.await.unwrap().unwrap(), expected);
}
