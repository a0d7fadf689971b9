//! Exponential moving average over a fixed smoothing period.

/// Exponential moving average seeded with the first observed price.
#[derive(Debug, Clone)]
pub struct Ema {
    multiplier: f64,
    value: Option<f64>,
}

impl Ema {
    /// Create an empty average over `period` samples. A zero period behaves as 1.
    pub fn new(period: usize) -> Self {
        Self {
            multiplier: 2.0 / (period.max(1) as f64 + 1.0),
            value: None,
        }
    }

    /// Push a new price and return the updated average.
    ///
    /// A result that is not finite is discarded: the previous value is kept and `None`
    /// is returned for this update.
    pub fn push(&mut self, price: f64) -> Option<f64> {
        let next = match self.value {
            None => price,
            Some(prev) => price * self.multiplier + prev * (1.0 - self.multiplier),
        };
        if !next.is_finite() {
            return None;
        }
        self.value = Some(next);
        self.value
    }

    /// Current value; `None` until the first price.
    pub fn value(&self) -> Option<f64> {
        self.value
    }
}
