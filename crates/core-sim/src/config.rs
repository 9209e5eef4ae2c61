use serde::{Deserialize, Serialize};

use crate::instrument::{InstrumentSpec, Symbol};

/// Tunables for one simulator session.
///
/// `Default` carries the constants the game ships with: two instruments,
/// 10k starting cash and five ticks per candle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    pub starting_cash: f64,
    pub instruments: Vec<InstrumentSpec>,
    /// Centre of the per-tick uniform draw. Anything above 0.5 skews ticks downward.
    pub tick_bias: f64,
    pub price_floor: f64,
    pub ticks_per_candle: u32,
    pub max_candles: usize,
    pub seed_candles: usize,
    /// Fraction of the start price the seeded history begins from.
    pub seed_start_discount: f64,
    pub seed_bias: f64,
    pub seed_candle_spacing_ms: i64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            starting_cash: 10_000.0,
            instruments: vec![
                InstrumentSpec::new(Symbol::new("RTX"), 185.20, 0.02).with_quantity_stepper(5, 1_000),
                InstrumentSpec::new(Symbol::new("NOK"), 6.40, 0.03).with_quantity_stepper(50, 10_000),
            ],
            tick_bias: 0.52,
            price_floor: 0.01,
            ticks_per_candle: 5,
            max_candles: 25,
            seed_candles: 20,
            seed_start_discount: 0.95,
            seed_bias: 0.45,
            seed_candle_spacing_ms: 5_000,
        }
    }
}

impl SimConfig {
    pub fn with_starting_cash(self, starting_cash: f64) -> Self {
        Self {
            starting_cash,
            ..self
        }
    }

    pub fn with_instruments(self, instruments: Vec<InstrumentSpec>) -> Self {
        Self {
            instruments,
            ..self
        }
    }

    // clamps to 0.0 and 1.0
    pub fn with_tick_bias(self, tick_bias: f64) -> Self {
        Self {
            tick_bias: tick_bias.clamp(0.0, 1.0),
            ..self
        }
    }

    pub fn with_seed_candles(self, seed_candles: usize) -> Self {
        Self {
            seed_candles,
            ..self
        }
    }

    pub fn with_ticks_per_candle(self, ticks_per_candle: u32) -> Self {
        Self {
            ticks_per_candle: ticks_per_candle.max(1),
            ..self
        }
    }

    pub fn with_max_candles(self, max_candles: usize) -> Self {
        Self {
            max_candles,
            ..self
        }
    }
}
