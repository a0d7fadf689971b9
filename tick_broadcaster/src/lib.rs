//! Tick replay broadcaster.
//!
//! Loads a static, timestamp-sorted tick table and replays it as a cyclic live feed:
//!
//! - `model::tick_store`: the tick table, loaded once and read-only afterwards.
//! - `model::replay_cursor`: groups records by timestamp and gap-fills missing symbols
//!   with their last known price.
//! - `broadcaster`: paces the cursor and publishes one `FeedMessage` per interval to all
//!   subscribers through a `tick_common::SubscriberHub`.
#![warn(missing_docs)]
pub mod broadcaster;
pub mod model;
