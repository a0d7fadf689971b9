//! Broadcaster wire protocol.
//!
//! One `FeedMessage` is produced per replayed timestamp. It wraps the `Batch` of stocks
//! observed (or gap-filled) at that timestamp together with the wall-clock time at which
//! the broadcaster generated it.
use std::collections::BTreeMap;

use chrono::Local;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::result::Result;

/// Security type column of the tick table.
///
/// Decoding never fails: unrecognized tags map to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(from = "String")]
#[strum(ascii_case_insensitive)]
pub enum SecurityType {
    /// Equity (`E`).
    #[serde(rename = "E")]
    #[strum(serialize = "E")]
    Equity,
    /// Index (`I`).
    #[serde(rename = "I")]
    #[strum(serialize = "I")]
    Index,
    /// Anything the tick table labels differently.
    #[serde(rename = "UNKNOWN")]
    #[strum(serialize = "UNKNOWN")]
    Unknown,
}

impl From<String> for SecurityType {
    fn from(tag: String) -> Self {
        tag.trim().parse().unwrap_or(SecurityType::Unknown)
    }
}

/// Whether a batch entry was observed at this timestamp or carried forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PriceType {
    /// Observed in the current batch.
    Current,
    /// Gap-filled from the last valid observation.
    LastKnown,
}

/// One stock inside a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockQuote {
    /// Price for this timestamp; `None` only when a peer sends `null`.
    #[serde(default)]
    pub price: Option<f64>,
    /// Security type from the tick table.
    pub sec_type: SecurityType,
    /// Observation or gap-fill marker.
    pub price_type: PriceType,
}

/// All stocks sharing one replayed timestamp, keyed by symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    /// Raw trading time of the group.
    pub trading_time: String,
    /// Raw trading date of the group.
    pub trading_date: String,
    /// Entries keyed by symbol; a symbol appears at most once.
    pub stocks: BTreeMap<String, StockQuote>,
}

impl Batch {
    /// Number of entries tagged `last_known`.
    pub fn gap_filled(&self) -> usize {
        self.stocks
            .values()
            .filter(|quote| quote.price_type == PriceType::LastKnown)
            .count()
    }
}

/// Broadcaster message: a batch stamped with its generation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedMessage {
    /// ISO-8601 generation time.
    pub timestamp: String,
    /// Replayed batch.
    pub data: Batch,
}

impl FeedMessage {
    /// Stamp `data` with the current local time.
    pub fn new(data: Batch) -> Self {
        Self {
            timestamp: Local::now().to_rfc3339(),
            data,
        }
    }

    /// Encode the message as a single JSON line payload.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a message received from the wire.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
