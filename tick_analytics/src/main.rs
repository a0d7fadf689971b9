//! Analytics consumer: enriches the tick feed with streaming indicators.
//!
//! The binary subscribes to the tick broadcaster and, for every batch:
//!
//! 1. runs the `IndicatorEngine` on each stock (EMA 38, EMA 100, crossover breakouts),
//! 2. swaps the complete result into the `SnapshotStore`,
//! 3. publishes it to its own subscribers through a `SubscriberHub`.
//!
//! Threads:
//! - main thread: `FeedClient`, reconnecting to the broadcaster after a fixed backoff;
//!   it owns the indicator state exclusively.
//! - analytics accept thread: subscribers of the enriched feed, one writer thread each.
//! - query accept thread: point-in-time reads of the latest snapshot.
//!
//! Usage example (CLI):
//! ```bash
//! tick_analytics --feed-addr 127.0.0.1:8001 --port 8002 --query-port 8003
//! ```
#![warn(missing_docs)]
mod args;

use std::net::TcpListener;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use clap::Parser;
use log::info;
use tick_analytics::feed_client::{DEFAULT_READ_TIMEOUT, FeedClient, FixedBackoff, TcpConnector};
use tick_analytics::indicator::{IndicatorConfig, IndicatorEngine};
use tick_analytics::processor::BatchProcessor;
use tick_analytics::query::serve_queries;
use tick_analytics::snapshot::SnapshotStore;
use tick_common::hub::{DEFAULT_WRITE_TIMEOUT, accept_subscribers};
use tick_common::net::addr;
use tick_common::{FeedError, Result, SubscriberHub};

use crate::args::Args;

fn main() -> Result<(), FeedError> {
    init_logger();
    let args = Args::parse();
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            info!("Ctrl+C received. Shutting down consumer...");
            shutdown.store(true, Ordering::SeqCst);
        })
        .map_err(|e| FeedError::Format(format!("Error setting Ctrl+C handler: {}", e)))?;
    }

    let hub = SubscriberHub::new(args.subscriber_capacity);
    let store = SnapshotStore::new();

    let analytics_listener = TcpListener::bind(addr(&args.bind_ip, args.port))?;
    let accept_hub = hub.clone();
    thread::spawn(move || accept_subscribers(analytics_listener, accept_hub, DEFAULT_WRITE_TIMEOUT));

    let query_listener = TcpListener::bind(addr(&args.bind_ip, args.query_port))?;
    let query_store = store.clone();
    thread::spawn(move || serve_queries(query_listener, query_store));

    let mut processor = BatchProcessor::new(IndicatorEngine::new(IndicatorConfig::default()), store, hub);
    let mut client = FeedClient::new(
        TcpConnector::new(&args.feed_addr, DEFAULT_READ_TIMEOUT)
            .with_connect_timeout(Duration::from_millis(args.connect_timeout_ms)),
        FixedBackoff::new(Duration::from_secs(args.reconnect_delay_secs)),
        shutdown,
    );
    info!("Consuming feed from {}", args.feed_addr);
    client.run(|line| processor.handle_line(line));
    Ok(())
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
