//! Command-line arguments for the analytics consumer.
//!
//! This module defines the CLI interface using `clap`. See `main` for end-to-end usage.
use clap::Parser;
use tick_analytics::feed_client::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_RECONNECT_DELAY};
use tick_common::hub::DEFAULT_SUBSCRIBER_CAPACITY;
use tick_common::net::{ANALYTICS_PORT, FEED_PORT, QUERY_PORT};

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Broadcaster feed address ("host:port").
    #[clap(long, default_value_t = format!("127.0.0.1:{}", FEED_PORT))]
    pub feed_addr: String,

    /// Address to bind the analytics and query listeners to.
    #[clap(long, default_value = "0.0.0.0")]
    pub bind_ip: String,

    /// TCP port of the enriched analytics feed.
    #[clap(long, default_value_t = ANALYTICS_PORT)]
    pub port: u16,

    /// TCP port of the query surface.
    #[clap(long, default_value_t = QUERY_PORT)]
    pub query_port: u16,

    /// Seconds to wait before reconnecting to the feed.
    #[clap(long, default_value_t = DEFAULT_RECONNECT_DELAY.as_secs())]
    pub reconnect_delay_secs: u64,

    /// Milliseconds a single connection attempt may take.
    #[clap(long, default_value_t = DEFAULT_CONNECT_TIMEOUT.as_millis() as u64)]
    pub connect_timeout_ms: u64,

    /// Messages a subscriber may lag behind before it is dropped.
    #[clap(long, default_value_t = DEFAULT_SUBSCRIBER_CAPACITY)]
    pub subscriber_capacity: usize,
}
