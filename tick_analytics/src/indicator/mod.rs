//! Streaming per-symbol indicators.
//!
//! The `IndicatorEngine` owns one `SymbolState` per symbol and updates it incrementally
//! from a sequential stream of prices:
//!
//! - a bounded price history (the most recent `history_len` samples),
//! - a short and a long `Ema`, each seeded with the first valid price,
//! - a `CrossoverDetector` that reports bullish/bearish breakouts once both averages exist
//!   and at least `min_samples` samples were collected.
//!
//! Every float leaving the engine is rounded to `precision` decimals, and anything that is
//! not finite becomes `None`.
//!
//! The engine is owned by the single ingestion thread; it is never shared.
use std::collections::{HashMap, VecDeque};

use log::debug;
use tick_common::analytics::StockAnalytics;

pub mod crossover;
pub mod ema;

use crate::indicator::crossover::{Breakout, CrossoverDetector, Trend};
use crate::indicator::ema::Ema;

/// Short EMA period.
pub const SHORT_PERIOD: usize = 38;
/// Long EMA period.
pub const LONG_PERIOD: usize = 100;
/// Samples kept per symbol.
pub const HISTORY_LEN: usize = 100;
/// Samples required before crossovers are evaluated.
pub const MIN_CROSSOVER_SAMPLES: usize = 3;
/// Decimal places of every published value.
pub const PRECISION: i32 = 4;

/// Tunables of the indicator engine.
#[derive(Debug, Clone, Copy)]
pub struct IndicatorConfig {
    /// Short EMA period.
    pub short_period: usize,
    /// Long EMA period.
    pub long_period: usize,
    /// Maximum length of the price history.
    pub history_len: usize,
    /// Samples required before crossovers are evaluated.
    pub min_crossover_samples: usize,
    /// Decimal places of every published value.
    pub precision: i32,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            short_period: SHORT_PERIOD,
            long_period: LONG_PERIOD,
            history_len: HISTORY_LEN,
            min_crossover_samples: MIN_CROSSOVER_SAMPLES,
            precision: PRECISION,
        }
    }
}

/// Round `value` to `decimals` places; non-finite input becomes `None`.
pub fn sanitize(value: f64, decimals: i32) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    let factor = 10f64.powi(decimals);
    let scaled = value * factor;
    if !scaled.is_finite() {
        // Magnitude too large to carry any fractional digits.
        return Some(value);
    }
    let rounded = scaled.round() / factor;
    rounded.is_finite().then_some(rounded)
}

/// Result of one engine update, already sanitized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StockReading {
    /// Price that was applied.
    pub current_price: Option<f64>,
    /// Short EMA.
    pub ema_short: Option<f64>,
    /// Long EMA.
    pub ema_long: Option<f64>,
    /// Change against the previous sample.
    pub price_change: Option<f64>,
    /// Change against the previous sample, in percent.
    pub price_change_percent: Option<f64>,
    /// Bullish crossover on this update.
    pub is_bullish_breakout: Option<bool>,
    /// Bearish crossover on this update.
    pub is_bearish_breakout: Option<bool>,
    /// Samples currently in the history.
    pub samples_collected: usize,
}

impl StockReading {
    /// Attach identity and batch time, producing the published entry.
    pub fn into_analytics(self, stock_id: &str, trading_time: &str) -> StockAnalytics {
        StockAnalytics {
            stock_id: stock_id.to_string(),
            current_price: self.current_price,
            ema38: self.ema_short,
            ema100: self.ema_long,
            is_bullish_breakout: self.is_bullish_breakout,
            is_bearish_breakout: self.is_bearish_breakout,
            price_change: self.price_change,
            price_change_percent: self.price_change_percent,
            trading_time: trading_time.to_string(),
            samples_collected: self.samples_collected,
        }
    }
}

/// Streaming state of one symbol.
#[derive(Debug, Clone)]
pub struct SymbolState {
    history: VecDeque<f64>,
    ema_short: Ema,
    ema_long: Ema,
    crossover: CrossoverDetector,
}

impl SymbolState {
    fn new(config: &IndicatorConfig) -> Self {
        Self {
            history: VecDeque::with_capacity(config.history_len),
            ema_short: Ema::new(config.short_period),
            ema_long: Ema::new(config.long_period),
            crossover: CrossoverDetector::default(),
        }
    }

    fn push(&mut self, price: f64, config: &IndicatorConfig) -> StockReading {
        let previous = self.history.back().copied();
        while self.history.len() >= config.history_len.max(1) {
            self.history.pop_front();
        }
        self.history.push_back(price);

        let short = self.ema_short.push(price);
        let long = self.ema_long.push(price);
        let samples = self.history.len();

        let (price_change, price_change_percent) = match previous {
            Some(prev) if prev != 0.0 => {
                let change = price - prev;
                (Some(change), Some(change / prev * 100.0))
            }
            _ => (None, None),
        };

        let breakout = match (short, long) {
            (Some(short), Some(long)) if samples >= config.min_crossover_samples => {
                self.crossover.update(short, long)
            }
            _ => None,
        };

        let precision = config.precision;
        StockReading {
            current_price: sanitize(price, precision),
            ema_short: short.and_then(|value| sanitize(value, precision)),
            ema_long: long.and_then(|value| sanitize(value, precision)),
            price_change: price_change.and_then(|value| sanitize(value, precision)),
            price_change_percent: price_change_percent.and_then(|value| sanitize(value, precision)),
            is_bullish_breakout: Some(breakout == Some(Breakout::Bullish)),
            is_bearish_breakout: Some(breakout == Some(Breakout::Bearish)),
            samples_collected: samples,
        }
    }

    /// Recent prices, oldest first.
    pub fn history(&self) -> &VecDeque<f64> {
        &self.history
    }

    /// Unrounded short EMA.
    pub fn ema_short(&self) -> Option<f64> {
        self.ema_short.value()
    }

    /// Unrounded long EMA.
    pub fn ema_long(&self) -> Option<f64> {
        self.ema_long.value()
    }

    /// Side remembered by the crossover detector.
    pub fn trend(&self) -> Trend {
        self.crossover.prior()
    }
}

/// Per-symbol indicator state machine.
#[derive(Debug, Default)]
pub struct IndicatorEngine {
    config: IndicatorConfig,
    states: HashMap<String, SymbolState>,
}

impl IndicatorEngine {
    /// Create an engine with the given tunables.
    pub fn new(config: IndicatorConfig) -> Self {
        Self {
            config,
            states: HashMap::new(),
        }
    }

    /// Apply one price for `symbol`.
    ///
    /// An absent or non-finite price leaves the state untouched and yields a reading with
    /// every derived field set to `None`.
    pub fn update(&mut self, symbol: &str, price: Option<f64>) -> StockReading {
        let Some(price) = price.filter(|price| price.is_finite()) else {
            debug!("No usable price for {}", symbol);
            return StockReading {
                samples_collected: self.state(symbol).map_or(0, |state| state.history.len()),
                ..StockReading::default()
            };
        };
        let config = self.config;
        self.states
            .entry(symbol.to_string())
            .or_insert_with(|| SymbolState::new(&config))
            .push(price, &config)
    }

    /// State of `symbol`, if any valid price was seen.
    pub fn state(&self, symbol: &str) -> Option<&SymbolState> {
        self.states.get(symbol)
    }
}
