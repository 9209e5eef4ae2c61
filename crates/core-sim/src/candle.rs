use serde::{Deserialize, Serialize};

/// OHLC aggregate over a fixed number of ticks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Unix time in milliseconds at which the candle opened.
    pub timestamp_ms: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    /// A candle with all four prices at `price`.
    pub fn flat(price: f64, timestamp_ms: i64) -> Self {
        Self {
            timestamp_ms,
            open: price,
            high: price,
            low: price,
            close: price,
        }
    }

    pub fn update(&mut self, price: f64) {
        if price > self.high {
            self.high = price;
        }
        if price < self.low {
            self.low = price;
        }
        self.close = price;
    }

    pub fn is_well_formed(&self) -> bool {
        self.high >= self.open.max(self.close) && self.low <= self.open.min(self.close)
    }

    pub fn is_bullish(&self) -> bool {
        self.close >= self.open
    }
}

#[cfg(test)]
mod tests {
    use super::Candle;

    #[test]
    fn flat_candle_is_well_formed() {
        let candle = Candle::flat(6.4, 1_000);

        assert_eq!(candle.open, 6.4);
        assert_eq!(candle.high, 6.4);
        assert_eq!(candle.low, 6.4);
        assert_eq!(candle.close, 6.4);
        assert!(candle.is_well_formed());
    }

    #[test]
    fn update_widens_range_and_moves_close() {
        let mut candle = Candle::flat(100.0, 0);

        candle.update(103.0);
        candle.update(98.5);
        candle.update(101.0);

        assert_eq!(candle.open, 100.0);
        assert_eq!(candle.high, 103.0);
        assert_eq!(candle.low, 98.5);
        assert_eq!(candle.close, 101.0);
        assert!(candle.is_well_formed());
        assert!(candle.is_bullish());
    }

    #[test]
    fn hand_built_candle_with_high_below_close_is_rejected() {
        let candle = Candle {
            timestamp_ms: 0,
            open: 10.0,
            high: 10.5,
            low: 9.0,
            close: 11.0,
        };

        assert!(!candle.is_well_formed());
    }
}
