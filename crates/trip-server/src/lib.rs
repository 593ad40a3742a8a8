//! trip-server
//!
//! Concurrent TCP booking server. Every connection gets its own task;
//! a single ledger task owns the running totals, so updates from all
//! connections are applied one at a time.

pub mod config;
pub mod types;
pub mod server;
pub mod client;
pub mod ledger_task;

pub use config::Config;
pub use ledger_task::LedgerHandle;
pub use types::{ClientId, ServerContext};
