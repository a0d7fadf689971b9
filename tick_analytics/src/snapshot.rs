//! Latest analytics snapshot and its read-only query surface.
//!
//! The snapshot is the only state shared between the ingestion thread and readers. It is
//! held as `Arc<Snapshot>` and replaced as a whole on every batch, so a reader always
//! sees one complete batch and never a mix of two.
use std::sync::{Arc, RwLock};

use tick_common::analytics::{Snapshot, StockAnalytics};
use tick_common::query::{Query, QueryResponse};
use tick_common::{FeedError, Result};

/// Shared handle to the latest snapshot.
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    current: Arc<RwLock<Arc<Snapshot>>>,
}

impl SnapshotStore {
    /// Create a store holding an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a new snapshot and return it.
    pub fn replace(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let next = Arc::new(snapshot);
        let mut current = self.current.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *current = Arc::clone(&next);
        next
    }

    /// Latest complete snapshot.
    pub fn latest(&self) -> Arc<Snapshot> {
        let current = self.current.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&current)
    }

    /// Entry for `symbol` in the latest snapshot.
    pub fn symbol(&self, symbol: &str) -> Result<StockAnalytics> {
        self.latest()
            .stocks
            .get(symbol)
            .cloned()
            .ok_or_else(|| FeedError::SymbolNotFound(symbol.to_string()))
    }

    /// Entries of the latest snapshot with a breakout flag set.
    pub fn active_breakouts(&self) -> Vec<StockAnalytics> {
        self.latest()
            .stocks
            .values()
            .filter(|stock| stock.has_breakout())
            .cloned()
            .collect()
    }

    /// Answer a query from the latest snapshot.
    pub fn answer(&self, query: &Query) -> QueryResponse {
        match query {
            Query::Snapshot => QueryResponse::Snapshot(self.latest().as_ref().clone()),
            Query::Symbol { symbol } => match self.symbol(symbol) {
                Ok(stock) => QueryResponse::Stock(stock),
                Err(_) => QueryResponse::NotFound(symbol.clone()),
            },
            Query::Breakouts => QueryResponse::Breakouts(self.active_breakouts()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn stock(id: &str, bullish: Option<bool>, bearish: Option<bool>) -> StockAnalytics {
        StockAnalytics {
            stock_id: id.to_string(),
            current_price: Some(1.0),
            ema38: Some(1.0),
            ema100: Some(1.0),
            is_bullish_breakout: bullish,
            is_bearish_breakout: bearish,
            price_change: None,
            price_change_percent: None,
            trading_time: "08:00:00".to_string(),
            samples_collected: 3,
        }
    }

    fn snapshot(stocks: Vec<StockAnalytics>) -> Snapshot {
        Snapshot {
            timestamp: "2021-11-08T08:00:00+00:00".to_string(),
            trading_date: "08-11-2021".to_string(),
            trading_time: "08:00:00".to_string(),
            stocks: stocks
                .into_iter()
                .map(|stock| (stock.stock_id.clone(), stock))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn symbol_lookup_and_not_found() {
        let store = SnapshotStore::new();
        store.replace(snapshot(vec![stock("A", Some(false), Some(false))]));
        assert_eq!(store.symbol("A").unwrap().stock_id, "A");
        assert!(matches!(store.symbol("B"), Err(FeedError::SymbolNotFound(_))));
        assert_eq!(
            store.answer(&Query::Symbol { symbol: "B".to_string() }),
            QueryResponse::NotFound("B".to_string())
        );
    }

    #[test]
    fn breakouts_are_filtered_from_the_snapshot() {
        let store = SnapshotStore::new();
        store.replace(snapshot(vec![
            stock("A", Some(true), Some(false)),
            stock("B", Some(false), Some(false)),
            stock("C", Some(false), Some(true)),
            stock("D", None, None),
        ]));
        let ids: Vec<String> = store.active_breakouts().into_iter().map(|s| s.stock_id).collect();
        assert_eq!(ids, ["A", "C"]);
    }

    #[test]
    fn readers_keep_their_version_across_replace() {
        let store = SnapshotStore::new();
        store.replace(snapshot(vec![stock("A", None, None)]));
        let before = store.latest();
        store.replace(snapshot(vec![stock("B", None, None)]));
        assert!(before.stocks.contains_key("A"));
        assert!(store.latest().stocks.contains_key("B"));
        assert!(!store.latest().stocks.contains_key("A"));
    }
}
