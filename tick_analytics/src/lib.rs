//! Streaming analytics consumer.
//!
//! Subscribes to the tick broadcaster, enriches every batch with per-symbol indicators and
//! republishes the result:
//!
//! - `feed_client`: reconnecting feed subscriber with an explicit connection state machine.
//! - `indicator`: per-symbol EMA and crossover state, updated incrementally.
//! - `processor`: applies the engine to each batch and publishes the new snapshot.
//! - `snapshot`: atomically replaced latest snapshot and the read-only queries on it.
//! - `query`: TCP query port serving `snapshot`, `symbol` and `breakouts` requests.
#![warn(missing_docs)]
pub mod feed_client;
pub mod indicator;
pub mod processor;
pub mod query;
pub mod snapshot;
