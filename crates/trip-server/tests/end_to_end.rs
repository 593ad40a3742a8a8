//! Full server over loopback TCP.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use trip_core::{BookingMessage, Guest, Ledger, TripOffer};
use trip_protocol::encode_record;
use trip_server::config::Config;
use trip_server::{server, ClientId, ServerContext};

struct Running {
    addr: std::net::SocketAddr,
    ctx: Arc<ServerContext>,
    stop: oneshot::Sender<()>,
    task: JoinHandle<anyhow::Result<Ledger>>,
}

async fn start() -> Running {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let ctx = Arc::new(ServerContext::new());
    let (stop, stopped) = oneshot::channel::<()>();
    let task = tokio::spawn(server::serve(listener, Arc::clone(&ctx), async move {
        let _ = stopped.await;
    }));
    Running {
        addr,
        ctx,
        stop,
        task,
    }
}

async fn wait_for_records(ctx: &ServerContext, count: u64) -> Ledger {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let ledger = ctx.ledger().snapshot().await.unwrap();
            if ledger.record_count >= count {
                return ledger;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("ledger never reached the expected count")
}

async fn send(stream: &mut TcpStream, msg: &BookingMessage) {
    stream.write_all(&encode_record(msg).unwrap()).await.unwrap();
}

fn booking(party: u32) -> BookingMessage {
    let guest = Guest {
        first_name: "Kofi".to_string(),
        last_name: "Mensah".to_string(),
        age: 41,
        address: "3 Ring Road".to_string(),
    };
    let offer = TripOffer::new("Nairobi", 50.0).unwrap();
    BookingMessage::booking(guest, &offer, party).unwrap()
}

#[tokio::test]
async fn booking_summary_and_terminate_across_clients() {
    let server = start().await;

    let mut booker = TcpStream::connect(server.addr).await.unwrap();
    send(&mut booker, &booking(4)).await;
    send(&mut booker, &BookingMessage::terminate()).await;

    let expected = Ledger {
        record_count: 1,
        total_revenue: 200.0,
    };
    assert_eq!(wait_for_records(&server.ctx, 1).await, expected);

    let mut auditor = TcpStream::connect(server.addr).await.unwrap();
    send(&mut auditor, &BookingMessage::request_summary()).await;
    send(&mut auditor, &BookingMessage::request_summary()).await;
    send(&mut auditor, &BookingMessage::terminate()).await;
    drop(auditor);
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(server.ctx.ledger().snapshot().await.unwrap(), expected);

    server.stop.send(()).unwrap();
    assert_eq!(server.task.await.unwrap().unwrap(), expected);
}

#[tokio::test]
async fn abrupt_disconnects_do_not_disturb_other_clients() {
    let server = start().await;

    let mut quitter = TcpStream::connect(server.addr).await.unwrap();
    send(&mut quitter, &booking(1)).await;
    let partial = encode_record(&booking(1)).unwrap();
    quitter.write_all(&partial[..10]).await.unwrap();
    drop(quitter);

    let mut steady = TcpStream::connect(server.addr).await.unwrap();
    send(&mut steady, &booking(2)).await;
    wait_for_records(&server.ctx, 2).await;
    send(&mut steady, &booking(3)).await;
    drop(steady);

    let ledger = wait_for_records(&server.ctx, 3).await;
    assert_eq!(ledger.total_revenue, 300.0);

    server.stop.send(()).unwrap();
    assert_eq!(server.task.await.unwrap().unwrap().record_count, 3);
}

#[tokio::test]
async fn shutdown_stops_accepting_and_reports_once() {
    let server = start().await;
    let addr = server.addr;

    server.stop.send(()).unwrap();
    assert_eq!(server.task.await.unwrap().unwrap(), Ledger::new());

    // The listener is gone with the accept loop.
    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn run_reports_bind_failure() {
    let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let config = Config {
        bind_addr: "127.0.0.1".to_string(),
        port: taken.local_addr().unwrap().port(),
    };

    let err = server::run(config, std::future::pending::<()>())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("cannot listen on"));
}

#[tokio::test]
async fn client_ids_count_up_and_never_wrap() {
    let ctx = ServerContext::new();
    assert_eq!(ctx.next_client_id(), Some(ClientId(1)));
    assert_eq!(ctx.next_client_id(), Some(ClientId(2)));

    let ctx = ServerContext::with_first_client_id(u32::MAX - 1);
    assert_eq!(ctx.next_client_id(), Some(ClientId(u32::MAX - 1)));
    assert_eq!(ctx.next_client_id(), Some(ClientId(u32::MAX)));
    assert_eq!(ctx.next_client_id(), None);
    assert_eq!(ctx.next_client_id(), None);
}

#[tokio::test]
async fn connections_past_the_last_id_are_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let ctx = Arc::new(ServerContext::with_first_client_id(u32::MAX));
    let (stop, stopped) = oneshot::channel::<()>();
    let task = tokio::spawn(server::serve(listener, Arc::clone(&ctx), async move {
        let _ = stopped.await;
    }));

    let mut last = TcpStream::connect(addr).await.unwrap();
    send(&mut last, &booking(1)).await;
    let ledger = wait_for_records(&ctx, 1).await;
    assert_eq!(ledger.record_count, 1);
    assert_eq!(
        ctx.ledger().last_booking().await.unwrap().unwrap().client_id,
        u32::MAX
    );

    // Accepted, then dropped without being served.
    let mut refused = TcpStream::connect(addr).await.unwrap();
    // The write may or may not see the reset; either way nothing is recorded.
    let _ = refused
        .write_all(&encode_record(&booking(5)).unwrap())
        .await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(ctx.ledger().snapshot().await.unwrap().record_count, 1);

    stop.send(()).unwrap();
    assert_eq!(task.await.unwrap().unwrap().record_count, 1);
}

#[test]
fn config_reads_overrides_and_rejects_bad_ports() {
    let defaults = Config::from_lookup(|_| None).unwrap();
    assert_eq!(defaults.socket_addr_string(), "0.0.0.0:8888");

    let custom = Config::from_lookup(|key| match key {
        "TRIP_BIND_ADDR" => Some("127.0.0.1".to_string()),
        "TRIP_PORT" => Some("9100".to_string()),
        _ => None,
    })
    .unwrap();
    assert_eq!(custom.socket_addr_string(), "127.0.0.1:9100");

    let err = Config::from_lookup(|key| (key == "TRIP_PORT").then(|| "eighty".to_string()))
        .unwrap_err();
    assert_eq!(err.key, "TRIP_PORT");
}
