//! Tick broadcaster: replays a static tick table as a live TCP feed.
//!
//! The binary loads the tick table once, then wires together:
//!
//! - `ReplayCursor`: yields one gap-filled `Batch` per distinct timestamp and wraps
//!   around at the end of the table.
//! - `Broadcaster`: a paced loop on the main thread that stamps each batch and
//!   publishes it to the `SubscriberHub`.
//! - Accept thread: every TCP connection to the feed port becomes a subscriber with its
//!   own writer thread. It receives the current batch right away, then one JSON line per
//!   round.
//!
//! Ctrl+C signals the broadcast loop to stop; the process exits once it returns.
//!
//! Usage example (CLI):
//! ```bash
//! tick_broadcaster --data ./data/extracted_stocks.csv --port 8001 --interval-ms 1000
//! ```
#![warn(missing_docs)]
mod args;

use std::net::TcpListener;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use crossbeam_channel::bounded;
use log::{error, info};
use tick_broadcaster::broadcaster::{Broadcaster, BroadcasterConfig};
use tick_broadcaster::model::replay_cursor::ReplayCursor;
use tick_broadcaster::model::tick_store::TickStore;
use tick_common::hub::{DEFAULT_WRITE_TIMEOUT, accept_subscribers};
use tick_common::net::addr;
use tick_common::{FeedError, Result, SubscriberHub};

use crate::args::Args;

fn main() -> Result<(), FeedError> {
    init_logger();
    let args = Args::parse();

    let store = Arc::new(TickStore::load(&args.data)?);
    let cursor = ReplayCursor::new(Arc::clone(&store));
    let hub = SubscriberHub::new(args.subscriber_capacity);

    let listener = TcpListener::bind(addr(&args.bind_ip, args.port))?;
    info!("Feed listener bound on {}", listener.local_addr()?);
    let accept_hub = hub.clone();
    thread::spawn(move || accept_subscribers(listener, accept_hub, DEFAULT_WRITE_TIMEOUT));

    let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
    ctrlc::set_handler(move || {
        info!("Ctrl+C received. Shutting down broadcaster...");
        if let Err(e) = shutdown_tx.try_send(()) {
            error!("Failed to signal shutdown: {}", e);
        }
    })
    .map_err(|e| FeedError::Format(format!("Error setting Ctrl+C handler: {}", e)))?;

    let config = BroadcasterConfig {
        interval: Duration::from_millis(args.interval_ms),
        error_delay: Duration::from_millis(args.error_delay_ms),
    };
    Broadcaster::new(cursor, hub, config).run(shutdown_rx);
    Ok(())
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
