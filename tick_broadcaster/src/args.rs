//! Command-line arguments for the tick broadcaster.
//!
//! This module defines the CLI interface using `clap`. See `main` for end-to-end usage.
use std::path::PathBuf;

use clap::Parser;
use tick_broadcaster::broadcaster::{DEFAULT_ERROR_DELAY, DEFAULT_INTERVAL};
use tick_common::hub::DEFAULT_SUBSCRIBER_CAPACITY;
use tick_common::net::FEED_PORT;

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the extracted tick table (CSV).
    #[clap(long, default_value = "data/extracted_stocks.csv")]
    pub data: PathBuf,

    /// Address to bind the feed listener to.
    #[clap(long, default_value = "0.0.0.0")]
    pub bind_ip: String,

    /// TCP port subscribers connect to.
    #[clap(long, default_value_t = FEED_PORT)]
    pub port: u16,

    /// Milliseconds between two broadcast rounds.
    #[clap(long, default_value_t = DEFAULT_INTERVAL.as_millis() as u64)]
    pub interval_ms: u64,

    /// Milliseconds to pause after a failed round.
    #[clap(long, default_value_t = DEFAULT_ERROR_DELAY.as_millis() as u64)]
    pub error_delay_ms: u64,

    /// Messages a subscriber may lag behind before it is dropped.
    #[clap(long, default_value_t = DEFAULT_SUBSCRIBER_CAPACITY)]
    pub subscriber_capacity: usize,
}
