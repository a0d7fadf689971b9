//!
//! Common types and utilities shared by the tick broadcaster and the analytics consumer.
//!
//! This crate aggregates:
//! - `error`: unified error type `FeedError` used across the workspace.
//! - `result`: handy `Result<T, FeedError>` alias.
//! - `feed`: broadcaster wire messages (`FeedMessage`, `Batch`, `StockQuote`).
//! - `analytics`: consumer wire messages and the `Snapshot` they are built from.
//! - `query`: request/response types of the consumer's query port.
//! - `net`: ports and newline-delimited JSON framing.
//! - `hub`: subscriber set with non-blocking, pruning fan-out.
#![warn(missing_docs)]
pub mod analytics;
pub mod error;
pub mod feed;
pub mod hub;
pub mod net;
pub mod query;
pub mod result;

pub use error::FeedError;
pub use hub::SubscriberHub;
pub use result::Result;
