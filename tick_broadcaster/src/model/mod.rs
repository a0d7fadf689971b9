//! Replay data model.
//!
//! - `tick_store`: the timestamp-sorted tick table loaded once at startup.
//! - `replay_cursor`: cyclic walk over the table producing gap-filled batches.

pub mod replay_cursor;
pub mod tick_store;
