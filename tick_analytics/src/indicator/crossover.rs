//! Short/long moving-average crossover detection.

/// Side of the long average the short average is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Trend {
    /// Short average above the long one.
    Bullish,
    /// Short average below the long one.
    Bearish,
    /// Not classified yet.
    #[default]
    Unknown,
}

impl Trend {
    /// Classify a pair of averages. Equal (or incomparable) averages give `Unknown`.
    pub fn classify(short: f64, long: f64) -> Self {
        if short > long {
            Trend::Bullish
        } else if short < long {
            Trend::Bearish
        } else {
            Trend::Unknown
        }
    }
}

/// Crossover event emitted on a change of side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Breakout {
    /// Short average crossed above the long one.
    Bullish,
    /// Short average crossed below the long one.
    Bearish,
}

/// Remembers the last side and reports when it flips.
#[derive(Debug, Clone, Default)]
pub struct CrossoverDetector {
    prior: Trend,
}

impl CrossoverDetector {
    /// Feed the current averages; returns a breakout when the side changed.
    ///
    /// The first classification never signals. Equal averages leave the remembered side
    /// untouched, so a cross that passes through equality is still reported once.
    pub fn update(&mut self, short: f64, long: f64) -> Option<Breakout> {
        let current = Trend::classify(short, long);
        if current == Trend::Unknown {
            return None;
        }
        let signal = match (self.prior, current) {
            (Trend::Bearish, Trend::Bullish) => Some(Breakout::Bullish),
            (Trend::Bullish, Trend::Bearish) => Some(Breakout::Bearish),
            _ => None,
        };
        self.prior = current;
        signal
    }

    /// Last classified side.
    pub fn prior(&self) -> Trend {
        self.prior
    }
}
