//! Consumer wire protocol: per-stock analytics and the snapshot they form.
//!
//! Every value that can legitimately be missing is an `Option`, so "no data" is serialized
//! as `null` and is never conflated with `0` or `false`.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::result::Result;

/// Enriched view of one stock after the latest batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockAnalytics {
    /// Symbol identifier.
    pub stock_id: String,
    /// Price that produced this entry.
    pub current_price: Option<f64>,
    /// Short exponential moving average (period 38).
    pub ema38: Option<f64>,
    /// Long exponential moving average (period 100).
    pub ema100: Option<f64>,
    /// Short EMA crossed above the long EMA on this update.
    pub is_bullish_breakout: Option<bool>,
    /// Short EMA crossed below the long EMA on this update.
    pub is_bearish_breakout: Option<bool>,
    /// Absolute change against the previous sample.
    pub price_change: Option<f64>,
    /// Relative change against the previous sample, in percent.
    pub price_change_percent: Option<f64>,
    /// Trading time of the batch.
    pub trading_time: String,
    /// Samples currently held in the bounded price history.
    pub samples_collected: usize,
}

impl StockAnalytics {
    /// `true` when either breakout flag fired on the latest update.
    pub fn has_breakout(&self) -> bool {
        self.is_bullish_breakout == Some(true) || self.is_bearish_breakout == Some(true)
    }
}

/// Latest fully processed batch, one entry per symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Generation timestamp carried over from the feed message.
    pub timestamp: String,
    /// Trading date of the batch.
    pub trading_date: String,
    /// Trading time of the batch.
    pub trading_time: String,
    /// Entries keyed by symbol.
    pub stocks: BTreeMap<String, StockAnalytics>,
}

impl Snapshot {
    /// Build the fan-out message for this snapshot.
    pub fn to_message(&self) -> AnalyticsMessage {
        AnalyticsMessage {
            timestamp: self.timestamp.clone(),
            stocks: self.stocks.values().cloned().collect(),
        }
    }
}

/// Message fanned out by the consumer after each batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsMessage {
    /// Generation timestamp of the source batch.
    pub timestamp: String,
    /// Analytics for every stock in the batch, ordered by symbol.
    pub stocks: Vec<StockAnalytics>,
}

impl AnalyticsMessage {
    /// Encode the message as a single JSON line payload.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
