use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{candle::Candle, config::SimConfig, instrument::Instrument, market::Market};

#[derive(Debug, Clone, Copy, PartialEq)]
struct WalkParams {
    tick_bias: f64,
    price_floor: f64,
    ticks_per_candle: u32,
    max_candles: usize,
    seed_candles: usize,
    seed_start_discount: f64,
    seed_bias: f64,
    seed_candle_spacing_ms: i64,
}

impl From<&SimConfig> for WalkParams {
    fn from(config: &SimConfig) -> Self {
        Self {
            tick_bias: config.tick_bias,
            price_floor: config.price_floor,
            ticks_per_candle: config.ticks_per_candle.max(1),
            max_candles: config.max_candles,
            seed_candles: config.seed_candles,
            seed_start_discount: config.seed_start_discount,
            seed_bias: config.seed_bias,
            seed_candle_spacing_ms: config.seed_candle_spacing_ms,
        }
    }
}

/// One step of the bounded random walk.
///
/// `unit` is a uniform draw in `[0, 1)`; the result never drops below `floor`.
pub fn walk_step(price: f64, unit: f64, bias: f64, volatility: f64, floor: f64) -> f64 {
    let delta = (unit - bias) * volatility * price;
    (price + delta).max(floor)
}

/// Random-walk price source with candle aggregation.
#[derive(Debug, Clone)]
pub struct PriceGenerator<R = ChaCha8Rng> {
    rng: R,
    params: WalkParams,
}

impl PriceGenerator<ChaCha8Rng> {
    pub fn new(seed: u64, config: &SimConfig) -> Self {
        Self::from_rng(ChaCha8Rng::seed_from_u64(seed), config)
    }
}

impl<R: RngCore> PriceGenerator<R> {
    pub fn from_rng(rng: R, config: &SimConfig) -> Self {
        assert!(
            config.price_floor.is_finite() && config.price_floor > 0.0,
            "price_floor must be finite and positive"
        );

        Self {
            rng,
            params: WalkParams::from(config),
        }
    }

    /// Moves `instrument` one tick and returns its new price.
    pub fn advance(&mut self, instrument: &mut Instrument, now_ms: i64) -> f64 {
        let unit: f64 = self.rng.gen();
        let price = walk_step(
            instrument.price(),
            unit,
            self.params.tick_bias,
            instrument.volatility(),
            self.params.price_floor,
        );

        instrument.apply_tick(
            price,
            now_ms,
            self.params.ticks_per_candle,
            self.params.max_candles,
        );
        price
    }

    pub fn advance_market(&mut self, market: &mut Market, now_ms: i64) {
        for instrument in market.iter_mut() {
            let price = self.advance(instrument, now_ms);
            tracing::trace!(symbol = %instrument.symbol(), price, "tick");
        }
    }

    /// Replaces the instrument's history with a synthetic run of closed candles
    /// ending at `now_ms`, and opens a fresh candle at the last close.
    pub fn seed_history(&mut self, instrument: &mut Instrument, now_ms: i64) {
        instrument.restart(now_ms);

        let count = self.params.seed_candles;
        if count == 0 {
            return;
        }

        let floor = self.params.price_floor;
        let volatility = instrument.volatility();
        let mut price = (instrument.start_price() * self.params.seed_start_discount).max(floor);

        for index in 0..count {
            let open = price;
            let wick = volatility * open;
            let close = walk_step(
                open,
                self.rng.gen(),
                self.params.seed_bias,
                volatility * 2.0,
                floor,
            );
            let high = open.max(close) + self.rng.gen::<f64>() * wick;
            let low = (open.min(close) - self.rng.gen::<f64>() * wick).max(floor);
            let steps_back = (count - index) as i64;

            instrument.push_closed(
                Candle {
                    timestamp_ms: now_ms - steps_back * self.params.seed_candle_spacing_ms,
                    open,
                    high,
                    low,
                    close,
                },
                self.params.max_candles,
            );
            price = close;
        }

        instrument.price = price;
        instrument.open_candle = Candle::flat(price, now_ms);
    }

    pub fn seed_market(&mut self, market: &mut Market, now_ms: i64) {
        for instrument in market.iter_mut() {
            self.seed_history(instrument, now_ms);
        }
    }
}
