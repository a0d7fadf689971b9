//! Query protocol of the consumer's read-only surface.
//!
//! A client writes one `Query` per line and reads one `QueryResponse` per line. All
//! answers are point-in-time reads of the latest snapshot.
use serde::{Deserialize, Serialize};

use crate::analytics::{Snapshot, StockAnalytics};

/// Request sent to the query port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "query", rename_all = "snake_case")]
pub enum Query {
    /// Whole snapshot.
    Snapshot,
    /// One symbol.
    Symbol {
        /// Requested symbol.
        symbol: String,
    },
    /// Stocks with an active breakout signal.
    Breakouts,
}

/// Answer written back by the query port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "body", rename_all = "snake_case")]
pub enum QueryResponse {
    /// Whole snapshot.
    Snapshot(Snapshot),
    /// A single stock.
    Stock(StockAnalytics),
    /// Stocks flagged with a breakout.
    Breakouts(Vec<StockAnalytics>),
    /// The requested symbol is not in the snapshot.
    NotFound(String),
    /// The request could not be decoded.
    Error(String),
}
