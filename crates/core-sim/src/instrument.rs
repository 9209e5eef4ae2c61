use std::{collections::VecDeque, fmt};

use serde::{Deserialize, Serialize};

use crate::candle::Candle;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDirection {
    Up,
    Down,
}

/// Static description of a tradable instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentSpec {
    pub symbol: Symbol,
    pub start_price: f64,
    pub volatility: f64,
    pub quantity_step: u64,
    pub max_quantity: u64,
}

impl InstrumentSpec {
    pub fn new(symbol: Symbol, start_price: f64, volatility: f64) -> Self {
        assert!(
            start_price.is_finite() && start_price > 0.0,
            "start_price must be finite and positive"
        );
        assert!(
            volatility.is_finite() && volatility >= 0.0,
            "volatility must be finite and non-negative"
        );

        Self {
            symbol,
            start_price,
            volatility,
            quantity_step: 1,
            max_quantity: u64::MAX,
        }
    }

    pub fn with_quantity_stepper(self, quantity_step: u64, max_quantity: u64) -> Self {
        Self {
            quantity_step: quantity_step.max(1),
            max_quantity: max_quantity.max(1),
            ..self
        }
    }

    /// Moves an order-quantity input one step, staying within `1..=max_quantity`.
    pub fn step_quantity(&self, current: u64, direction: StepDirection) -> u64 {
        let current = current.max(1);
        match direction {
            StepDirection::Up => current
                .saturating_add(self.quantity_step)
                .min(self.max_quantity),
            StepDirection::Down => current.saturating_sub(self.quantity_step).max(1),
        }
    }
}

/// Live price state for one instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct Instrument {
    spec: InstrumentSpec,
    pub(crate) price: f64,
    pub(crate) tick_count: u32,
    pub(crate) open_candle: Candle,
    pub(crate) history: VecDeque<Candle>,
}

impl Instrument {
    pub fn new(spec: InstrumentSpec, now_ms: i64) -> Self {
        let price = spec.start_price;
        Self {
            spec,
            price,
            tick_count: 0,
            open_candle: Candle::flat(price, now_ms),
            history: VecDeque::new(),
        }
    }

    pub fn spec(&self) -> &InstrumentSpec {
        &self.spec
    }

    pub fn symbol(&self) -> &Symbol {
        &self.spec.symbol
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn start_price(&self) -> f64 {
        self.spec.start_price
    }

    pub fn volatility(&self) -> f64 {
        self.spec.volatility
    }

    pub fn tick_count(&self) -> u32 {
        self.tick_count
    }

    pub fn open_candle(&self) -> &Candle {
        &self.open_candle
    }

    /// Closed candles, oldest first.
    pub fn history(&self) -> impl ExactSizeIterator<Item = &Candle> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn change(&self) -> f64 {
        self.price - self.spec.start_price
    }

    pub fn change_pct(&self) -> f64 {
        self.change() / self.spec.start_price * 100.0
    }

    /// Closed history followed by the open candle, as a chart would draw it.
    pub fn chart_series(&self) -> Vec<Candle> {
        self.history
            .iter()
            .copied()
            .chain(std::iter::once(self.open_candle))
            .collect()
    }

    /// Back to the start price with no history and a fresh open candle.
    pub fn restart(&mut self, now_ms: i64) {
        self.price = self.spec.start_price;
        self.tick_count = 0;
        self.open_candle = Candle::flat(self.price, now_ms);
        self.history.clear();
    }

    #[cfg(test)]
    pub(crate) fn set_price_for_test(&mut self, price: f64) {
        self.price = price;
        self.open_candle.update(price);
    }

    /// Books one tick at `price` and rolls the candle when it is due.
    pub(crate) fn apply_tick(
        &mut self,
        price: f64,
        now_ms: i64,
        ticks_per_candle: u32,
        max_candles: usize,
    ) {
        self.price = price;
        self.tick_count += 1;
        self.open_candle.update(price);

        if self.tick_count >= ticks_per_candle {
            self.tick_count = 0;
            self.push_closed(self.open_candle, max_candles);
            self.open_candle = Candle::flat(price, now_ms);
        }
    }

    pub(crate) fn push_closed(&mut self, candle: Candle, max_candles: usize) {
        self.history.push_back(candle);
        while self.history.len() > max_candles {
            self.history.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Instrument, InstrumentSpec, StepDirection, Symbol};
    use crate::candle::Candle;

    fn rtx() -> InstrumentSpec {
        InstrumentSpec::new(Symbol::new("RTX"), 185.20, 0.02).with_quantity_stepper(5, 1_000)
    }

    #[test]
    fn symbol_is_normalized_to_upper_case() {
        assert_eq!(Symbol::new("rtx"), Symbol::new("RTX"));
        assert_eq!(Symbol::from("nok").to_string(), "NOK");
    }

    #[test]
    fn candle_rolls_after_configured_ticks() {
        let mut instrument = Instrument::new(rtx(), 0);

        for tick in 1..=4 {
            instrument.apply_tick(185.0 + tick as f64, tick, 5, 25);
        }
        assert_eq!(instrument.history_len(), 0);
        assert_eq!(instrument.tick_count(), 4);

        instrument.apply_tick(190.0, 5, 5, 25);

        assert_eq!(instrument.history_len(), 1);
        assert_eq!(instrument.tick_count(), 0);
        let closed = instrument.history().next().copied().unwrap();
        assert_eq!(closed.open, 185.20);
        assert_eq!(closed.close, 190.0);
        assert_eq!(closed.high, 190.0);
        assert_eq!(*instrument.open_candle(), Candle::flat(190.0, 5));
    }

    #[test]
    fn history_evicts_oldest_candle_first() {
        let mut instrument = Instrument::new(rtx(), 0);

        for tick in 0..30_i64 {
            instrument.apply_tick(100.0 + tick as f64, tick, 1, 25);
        }

        assert_eq!(instrument.history_len(), 25);
        assert_eq!(instrument.history().next().map(|c| c.close), Some(105.0));
        assert_eq!(instrument.history().last().map(|c| c.close), Some(129.0));
    }

    #[test]
    fn chart_series_appends_open_candle() {
        let mut instrument = Instrument::new(rtx(), 0);
        instrument.apply_tick(186.0, 1, 1, 25);
        instrument.apply_tick(187.0, 2, 5, 25);

        let series = instrument.chart_series();

        assert_eq!(series.len(), 2);
        assert_eq!(series[1].close, 187.0);
    }

    #[test]
    fn change_is_measured_against_start_price() {
        let mut instrument = Instrument::new(rtx(), 0);
        instrument.apply_tick(203.72, 1, 5, 25);

        assert!((instrument.change() - 18.52).abs() < 1e-9);
        assert!((instrument.change_pct() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn stepper_respects_step_and_bounds() {
        let spec = rtx();

        assert_eq!(spec.step_quantity(1, StepDirection::Up), 6);
        assert_eq!(spec.step_quantity(998, StepDirection::Up), 1_000);
        assert_eq!(spec.step_quantity(3, StepDirection::Down), 1);
        assert_eq!(spec.step_quantity(0, StepDirection::Down), 1);
        assert_eq!(spec.step_quantity(20, StepDirection::Down), 15);
    }

    #[test]
    #[should_panic(expected = "start_price must be finite and positive")]
    fn spec_rejects_non_positive_start_price() {
        let _ = InstrumentSpec::new(Symbol::new("BAD"), 0.0, 0.01);
    }
}
