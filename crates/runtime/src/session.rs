use std::time::Duration;

use achievements::{AchievementEngine, EvalContext, Progress, Signals};
use core_sim::{
    parse_quantity, Market, PortfolioLedger, PortfolioSnapshot, PriceGenerator, SimConfig,
    Snapshot, StepDirection, Symbol, TradeAction, TradeError, TradeFill,
};
use serde::Serialize;

use crate::{
    clock::{ClockState, SimulationClock, Speed, BASE_INTERVAL},
    events::Presenter,
    logging::{LogEntry, LogKind, TradeLog},
};

/// Point-in-time view for a `status` query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStatus {
    pub snapshot: Snapshot,
    pub state: ClockState,
    pub speed: Speed,
    pub progress: Progress,
    pub recent_log: Vec<LogEntry>,
}

/// The whole mutable game: market, ledger, achievements, clock and log.
///
/// Every mutation goes through `&mut self`, so one owner drives it at a time.
#[derive(Debug, Clone)]
pub struct Session {
    config: SimConfig,
    generator: PriceGenerator,
    market: Market,
    ledger: PortfolioLedger,
    achievements: AchievementEngine,
    clock: SimulationClock,
    log: TradeLog,
    tick: u64,
}

impl Session {
    /// Builds a seeded, running session at 1x.
    pub fn new(config: SimConfig, seed: u64, now_ms: i64) -> Self {
        Self::with_clock(config, seed, SimulationClock::new(BASE_INTERVAL), now_ms)
    }

    pub fn with_clock(config: SimConfig, seed: u64, clock: SimulationClock, now_ms: i64) -> Self {
        let mut generator = PriceGenerator::new(seed, &config);
        let mut market = Market::new(&config.instruments, now_ms);
        generator.seed_market(&mut market, now_ms);

        let mut session = Self {
            ledger: PortfolioLedger::new(config.starting_cash),
            achievements: AchievementEngine::new(),
            log: TradeLog::new(),
            tick: 0,
            config,
            generator,
            market,
            clock,
        };
        session.log_initialized(now_ms);
        session.clock.start();

        tracing::info!(
            seed,
            instruments = session.market.len(),
            starting_cash = session.ledger.starting_cash(),
            "session started"
        );
        session
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn market(&self) -> &Market {
        &self.market
    }

    pub fn ledger(&self) -> &PortfolioLedger {
        &self.ledger
    }

    pub fn achievements(&self) -> &AchievementEngine {
        &self.achievements
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn log(&self) -> &TradeLog {
        &self.log
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn interval(&self) -> Duration {
        self.clock.interval()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self.tick, &self.ledger, &self.market)
    }

    pub fn status(&self, recent: usize) -> SessionStatus {
        SessionStatus {
            snapshot: self.snapshot(),
            state: self.clock.state(),
            speed: self.clock.speed(),
            progress: self.achievements.progress(),
            recent_log: self.log.entries().take(recent).cloned().collect(),
        }
    }

    /// Advances every instrument once and pushes the new state. Returns `false`
    /// without touching anything while the clock is paused.
    pub fn tick(&mut self, now_ms: i64, presenter: &mut impl Presenter) -> bool {
        if !self.clock.is_running() {
            return false;
        }

        self.generator.advance_market(&mut self.market, now_ms);
        self.tick += 1;
        tracing::debug!(tick = self.tick, "market advanced");

        self.evaluate(Signals::default(), now_ms, presenter);
        let snapshot = self.snapshot();
        presenter.on_tick(&snapshot);
        true
    }

    /// Executes a trade at the current price. Rejections leave the session
    /// untouched apart from an error log entry.
    pub fn submit_trade(
        &mut self,
        symbol: &Symbol,
        action: TradeAction,
        quantity: u64,
        now_ms: i64,
        presenter: &mut impl Presenter,
    ) -> Result<TradeFill, TradeError> {
        match self
            .ledger
            .execute_trade(&self.market, symbol, action, quantity)
        {
            Ok(fill) => {
                let message = fill.to_string();
                let kind = match action {
                    TradeAction::Buy => LogKind::Buy,
                    TradeAction::Sell => LogKind::Sell,
                };
                tracing::info!(
                    symbol = %fill.symbol,
                    action = %fill.action,
                    quantity = fill.quantity,
                    price = fill.price,
                    cash = self.ledger.cash(),
                    "trade filled"
                );
                self.log.record(now_ms, kind, message.clone());
                presenter.on_trade_result(true, &message);

                let signals = Signals::default().with_large_commitment(fill.large_commitment);
                self.evaluate(signals, now_ms, presenter);
                Ok(fill)
            }
            Err(err) => Err(self.reject(err, now_ms, presenter)),
        }
    }

    /// Text-level entry point: parses the quantity and resolves the symbol
    /// before trading, reporting parse failures like any other rejection.
    pub fn submit_order(
        &mut self,
        symbol: &str,
        action: TradeAction,
        quantity: &str,
        now_ms: i64,
        presenter: &mut impl Presenter,
    ) -> Result<TradeFill, TradeError> {
        let quantity = match parse_quantity(quantity) {
            Ok(quantity) => quantity,
            Err(err) => return Err(self.reject(err, now_ms, presenter)),
        };
        self.submit_trade(&Symbol::new(symbol), action, quantity, now_ms, presenter)
    }

    pub fn set_speed(&mut self, speed: Speed, now_ms: i64, presenter: &mut impl Presenter) {
        self.clock.set_speed(speed);
        self.clock_changed(now_ms, presenter);
    }

    pub fn cycle_speed(&mut self, now_ms: i64, presenter: &mut impl Presenter) -> Speed {
        let speed = self.clock.cycle_speed();
        self.clock_changed(now_ms, presenter);
        speed
    }

    pub fn pause(&mut self, presenter: &mut impl Presenter) -> ClockState {
        self.clock.pause();
        self.announce_clock(presenter);
        self.clock.state()
    }

    pub fn resume(&mut self, presenter: &mut impl Presenter) -> ClockState {
        self.clock.resume();
        self.announce_clock(presenter);
        self.clock.state()
    }

    pub fn toggle_pause(&mut self, presenter: &mut impl Presenter) -> ClockState {
        self.clock.toggle();
        self.announce_clock(presenter);
        self.clock.state()
    }

    /// Restores starting cash, clears holdings, stats and unlocks, and reseeds
    /// every instrument. Clock state and speed carry over.
    pub fn reset(&mut self, now_ms: i64, presenter: &mut impl Presenter) {
        self.ledger.reset();
        self.achievements.reset();
        self.generator.seed_market(&mut self.market, now_ms);
        self.tick = 0;

        self.log.clear();
        self.log_initialized(now_ms);
        self.log
            .record(now_ms, LogKind::System, "Game reset! Good luck, trader.");
        tracing::info!("session reset");

        let snapshot = self.snapshot();
        presenter.on_reset(&snapshot);
    }

    /// Quantity stepper for an instrument's order ticket.
    pub fn step_quantity(
        &self,
        symbol: &Symbol,
        current: u64,
        direction: StepDirection,
    ) -> Option<u64> {
        self.market
            .get(symbol)
            .map(|instrument| instrument.spec().step_quantity(current, direction))
    }

    fn evaluate(&mut self, signals: Signals, now_ms: i64, presenter: &mut impl Presenter) {
        self.ledger.observe_valuation(&self.market);
        let portfolio = PortfolioSnapshot::capture(&self.ledger, &self.market);

        for achievement in self
            .achievements
            .evaluate(&EvalContext::new(&portfolio, signals))
        {
            self.log.record(
                now_ms,
                LogKind::System,
                format!("Achievement unlocked: {}!", achievement.name),
            );
            presenter.on_achievement_unlocked(&achievement);
        }
    }

    fn reject(
        &mut self,
        err: TradeError,
        now_ms: i64,
        presenter: &mut impl Presenter,
    ) -> TradeError {
        let message = err.to_string();
        tracing::warn!(error = %message, "trade rejected");
        self.log.record(now_ms, LogKind::Error, message.clone());
        presenter.on_trade_result(false, &message);
        err
    }

    fn clock_changed(&mut self, now_ms: i64, presenter: &mut impl Presenter) {
        tracing::info!(speed = %self.clock.speed(), "speed changed");
        self.announce_clock(presenter);
        let signals = Signals::default().with_max_speed(self.clock.speed().is_max());
        self.evaluate(signals, now_ms, presenter);
    }

    fn announce_clock(&self, presenter: &mut impl Presenter) {
        tracing::info!(
            state = self.clock.state().as_str(),
            speed = %self.clock.speed(),
            "clock changed"
        );
        presenter.on_clock_changed(self.clock.state(), self.clock.speed());
    }

    fn log_initialized(&mut self, now_ms: i64) {
        let message = format!(
            "System initialized. Starting cash: ${:.2}",
            self.ledger.starting_cash()
        );
        self.log.record(now_ms, LogKind::System, message);
    }
}
