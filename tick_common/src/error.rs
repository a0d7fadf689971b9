//! Error types shared between the broadcaster and the analytics consumer.
//!
//! The `FeedError` enum unifies the failure cases of both services: I/O on files and
//! sockets, JSON encoding, tick table defects detected at startup, closed connections and
//! lookups against the analytics snapshot. Every crate in the workspace propagates
//! this single error type.
use std::io;

use thiserror::Error;

/// Unified error type shared by the broadcaster and the consumer.
#[derive(Error, Debug)]
pub enum FeedError {
    /// I/O error originating from the standard library or sockets/files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failure while encoding/decoding JSON via serde_json.
    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// Generic formatting/validation error with a human-readable message.
    #[error("Format error: {0}")]
    Format(String),

    /// The tick table header lacks a required column.
    #[error("Tick table is missing required column: {0}")]
    MissingColumn(String),

    /// The tick table contained no usable rows.
    #[error("Tick table {0} contains no usable records")]
    EmptyStore(String),

    /// A query asked for a symbol that is not in the latest snapshot.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// The peer closed the connection.
    #[error("Connection closed by {0}")]
    ConnectionClosed(String),
}
