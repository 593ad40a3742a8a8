//! TCP listener and top-level server wiring.
//!
//! This module:
//! - Listens on the configured address/port.
//! - Accepts new TCP connections until the shutdown future resolves.
//! - Assigns each connection a `ClientId` and spawns a task for it.
//! - Prints the final ledger summary once, on shutdown.
//!
//! Connection handling lives in `client`; the ledger lives in
//! `ledger_task`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};
use trip_core::Ledger;
use trip_protocol::text_codec::format_summary;

use crate::client::{self, SessionEnd};
use crate::config::Config;
use crate::types::ServerContext;

/// Pause after a failed `accept` (e.g. out of file descriptors).
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Bind and serve until `shutdown` resolves; returns the final ledger.
pub async fn run<F>(config: Config, shutdown: F) -> Result<Ledger>
where
    F: Future<Output = ()>,
{
    let addr = config.socket_addr_string();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("cannot listen on {}", addr))?;
    info!(%addr, "listening");

    serve(listener, Arc::new(ServerContext::new()), shutdown).await
}

/// Accept loop over an already bound listener.
///
/// In-flight connections are abandoned on shutdown: their tasks keep
/// running until the runtime stops, but nothing they record after this
/// returns is reported.
pub async fn serve<F>(listener: TcpListener, ctx: Arc<ServerContext>, shutdown: F) -> Result<Ledger>
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => {
                info!("shutdown requested, no longer accepting");
                break;
            }

            accepted = listener.accept() => {
                let (stream, peer_addr) = match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "accept failed");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                        continue;
                    }
                };

                let Some(client_id) = ctx.next_client_id() else {
                    warn!(peer = %peer_addr, "client ids exhausted, refusing connection");
                    continue;
                };
                info!(client = %client_id, peer = %peer_addr, "accepted connection");

                let ctx = Arc::clone(&ctx);
                tokio::spawn(async move {
                    match client::run_client(client_id, stream, ctx.ledger()).await {
                        Ok(SessionEnd::Terminated) | Ok(SessionEnd::Disconnected) => {}
                        Err(e) => warn!(client = %client_id, error = %e, "connection ended"),
                    }
                });
            }
        }
    }

    drop(listener);

    let ledger = ctx
        .ledger()
        .snapshot()
        .await
        .context("cannot read final ledger")?;
    println!("{}", format_summary(&ledger));
    info!(
        records = ledger.record_count,
        revenue = ledger.total_revenue,
        "final summary"
    );
    Ok(ledger)
}
