//! Cyclic replay over the tick table.
//!
//! `ReplayCursor::next_batch` returns every record that shares the current timestamp as
//! one `Batch`, then moves to the next distinct timestamp. When the table is exhausted the
//! cursor wraps to the start, so the feed never ends.
//!
//! Gap-filling: every symbol that has had a valid price at some point is tracked. When
//! such a symbol has no valid price in the current group, the batch carries its last known
//! price tagged `PriceType::LastKnown`. Last known prices survive the wraparound.
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use log::{debug, info};
use tick_common::feed::{Batch, PriceType, SecurityType, StockQuote};

use crate::model::tick_store::TickStore;

/// Walks a `TickStore` one timestamp group at a time.
pub struct ReplayCursor {
    store: Arc<TickStore>,
    position: usize,
    cycles: u64,
    last_known: HashMap<String, (f64, SecurityType)>,
}

impl ReplayCursor {
    /// Start a cursor at the first record of `store`.
    pub fn new(store: Arc<TickStore>) -> Self {
        Self {
            store,
            position: 0,
            cycles: 0,
            last_known: HashMap::new(),
        }
    }

    /// Produce the next batch, wrapping around at the end of the table.
    pub fn next_batch(&mut self) -> Batch {
        let ticks = self.store.ticks();
        if ticks.is_empty() {
            return Batch::default();
        }
        if self.position >= ticks.len() {
            self.position = 0;
            self.cycles += 1;
            info!("Reached end of tick data, starting over (cycle {})", self.cycles);
        }

        let start = self.position;
        let key = ticks[start].timestamp;
        let end = start + ticks[start..].iter().take_while(|tick| tick.timestamp == key).count();
        let group = &ticks[start..end];

        let mut stocks = BTreeMap::new();
        for tick in group {
            if let Some(price) = tick.price {
                self.last_known
                    .insert(tick.symbol.clone(), (price, tick.security_type));
                stocks.insert(
                    tick.symbol.clone(),
                    StockQuote {
                        price: Some(price),
                        sec_type: tick.security_type,
                        price_type: PriceType::Current,
                    },
                );
            }
        }
        for (symbol, (price, sec_type)) in &self.last_known {
            stocks.entry(symbol.clone()).or_insert(StockQuote {
                price: Some(*price),
                sec_type: *sec_type,
                price_type: PriceType::LastKnown,
            });
        }

        self.position = end;
        let batch = Batch {
            trading_time: group[0].trading_time.clone(),
            trading_date: group[0].trading_date.clone(),
            stocks,
        };
        debug!(
            "Batch {} {}: {} records, {} stocks, {} gap-filled",
            batch.trading_date,
            batch.trading_time,
            group.len(),
            batch.stocks.len(),
            batch.gap_filled()
        );
        batch
    }

    /// Index of the next record to replay.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Completed wraparounds.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }
}
