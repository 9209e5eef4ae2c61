mod candle;
mod config;
mod generators;
mod instrument;
mod ledger;
mod market;
mod snapshot;

pub use candle::Candle;
pub use config::SimConfig;
pub use generators::{walk_step, PriceGenerator};
pub use instrument::{Instrument, InstrumentSpec, StepDirection, Symbol};
pub use ledger::{
    parse_quantity, PortfolioLedger, TradeAction, TradeError, TradeFill, TradeStats,
    DEEP_DRAWDOWN_PCT, LARGE_COMMITMENT_RATIO,
};
pub use market::Market;
pub use snapshot::{InstrumentSnapshot, PortfolioSnapshot, PositionSnapshot, Snapshot};
