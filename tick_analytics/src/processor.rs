//! Batch processing: feed message in, snapshot and fan-out out.
//!
//! For each `FeedMessage` the processor runs the indicator engine on every stock in the
//! batch, builds the complete `Snapshot`, swaps it into the `SnapshotStore` and then
//! publishes it to the consumer's own subscribers.
use std::collections::BTreeMap;
use std::sync::Arc;

use log::{debug, error, warn};
use tick_common::analytics::Snapshot;
use tick_common::feed::FeedMessage;
use tick_common::{Result, SubscriberHub};

use crate::indicator::IndicatorEngine;
use crate::snapshot::SnapshotStore;

/// Turns feed batches into published snapshots.
pub struct BatchProcessor {
    engine: IndicatorEngine,
    store: SnapshotStore,
    hub: SubscriberHub,
}

impl BatchProcessor {
    /// Create a processor writing to `store` and publishing through `hub`.
    pub fn new(engine: IndicatorEngine, store: SnapshotStore, hub: SubscriberHub) -> Self {
        Self { engine, store, hub }
    }

    /// Process one decoded batch and return the snapshot it produced.
    pub fn process(&mut self, message: FeedMessage) -> Result<Arc<Snapshot>> {
        let FeedMessage { timestamp, data } = message;
        let stocks: BTreeMap<_, _> = data
            .stocks
            .iter()
            .map(|(symbol, quote)| {
                let reading = self.engine.update(symbol, quote.price);
                (symbol.clone(), reading.into_analytics(symbol, &data.trading_time))
            })
            .collect();

        let snapshot = self.store.replace(Snapshot {
            timestamp,
            trading_date: data.trading_date,
            trading_time: data.trading_time,
            stocks,
        });
        let payload = snapshot.to_message().to_json()?;
        let delivered = self.hub.publish(Arc::from(payload));
        debug!(
            "Processed batch {} with {} stocks, delivered to {} subscribers",
            snapshot.trading_time,
            snapshot.stocks.len(),
            delivered
        );
        Ok(snapshot)
    }

    /// Decode and process one raw feed line. Malformed lines are logged and skipped.
    pub fn handle_line(&mut self, line: &[u8]) {
        let message = match FeedMessage::from_json(line) {
            Ok(message) => message,
            Err(e) => {
                warn!("Skipping malformed feed message: {}", e);
                return;
            }
        };
        if let Err(e) = self.process(message) {
            error!("Failed to publish snapshot: {}", e);
        }
    }
}
