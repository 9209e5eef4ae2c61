use serde::{Deserialize, Serialize};

use crate::{
    candle::Candle,
    instrument::{Instrument, Symbol},
    ledger::{PortfolioLedger, TradeStats},
    market::Market,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub symbol: Symbol,
    pub shares: u64,
    pub price: f64,
    pub value: f64,
}

/// Read-only valuation of the ledger at current prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub cash: f64,
    pub starting_cash: f64,
    pub positions: Vec<PositionSnapshot>,
    pub portfolio_value: f64,
    pub total_value: f64,
    pub profit: f64,
    pub profit_pct: f64,
    pub stats: TradeStats,
}

impl PortfolioSnapshot {
    pub fn capture(ledger: &PortfolioLedger, market: &Market) -> Self {
        let positions: Vec<PositionSnapshot> = market
            .iter()
            .map(|instrument| {
                let shares = ledger.holding(instrument.symbol());
                PositionSnapshot {
                    symbol: instrument.symbol().clone(),
                    shares,
                    price: instrument.price(),
                    value: shares as f64 * instrument.price(),
                }
            })
            .collect();

        let portfolio_value: f64 = positions.iter().map(|p| p.value).sum();
        let total_value = ledger.cash() + portfolio_value;
        let profit = total_value - ledger.starting_cash();

        Self {
            cash: ledger.cash(),
            starting_cash: ledger.starting_cash(),
            positions,
            portfolio_value,
            total_value,
            profit,
            profit_pct: profit / ledger.starting_cash() * 100.0,
            stats: *ledger.stats(),
        }
    }

    pub fn position(&self, symbol: &str) -> Option<&PositionSnapshot> {
        self.positions.iter().find(|p| p.symbol.as_str() == symbol)
    }

    pub fn shares(&self, symbol: &str) -> u64 {
        self.position(symbol).map_or(0, |p| p.shares)
    }

    pub fn holds_every_instrument(&self) -> bool {
        !self.positions.is_empty() && self.positions.iter().all(|p| p.shares > 0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentSnapshot {
    pub symbol: Symbol,
    pub price: f64,
    pub start_price: f64,
    pub change: f64,
    pub change_pct: f64,
    /// Closed candles followed by the open one.
    pub candles: Vec<Candle>,
}

impl From<&Instrument> for InstrumentSnapshot {
    fn from(instrument: &Instrument) -> Self {
        Self {
            symbol: instrument.symbol().clone(),
            price: instrument.price(),
            start_price: instrument.start_price(),
            change: instrument.change(),
            change_pct: instrument.change_pct(),
            candles: instrument.chart_series(),
        }
    }
}

/// Everything the presentation layer needs to redraw after a tick or trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: u64,
    pub instruments: Vec<InstrumentSnapshot>,
    pub portfolio: PortfolioSnapshot,
}

impl Snapshot {
    pub fn capture(tick: u64, ledger: &PortfolioLedger, market: &Market) -> Self {
        Self {
            tick,
            instruments: market.iter().map(InstrumentSnapshot::from).collect(),
            portfolio: PortfolioSnapshot::capture(ledger, market),
        }
    }

    pub fn instrument(&self, symbol: &str) -> Option<&InstrumentSnapshot> {
        self.instruments.iter().find(|i| i.symbol.as_str() == symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::{PortfolioSnapshot, Snapshot};
    use crate::{
        instrument::{InstrumentSpec, Symbol},
        ledger::{PortfolioLedger, TradeAction},
        market::Market,
    };

    fn market() -> Market {
        Market::new(
            &[
                InstrumentSpec::new(Symbol::new("RTX"), 185.20, 0.02),
                InstrumentSpec::new(Symbol::new("NOK"), 6.40, 0.03),
            ],
            0,
        )
    }

    #[test]
    fn portfolio_snapshot_matches_ledger_queries() {
        let market = market();
        let mut ledger = PortfolioLedger::new(10_000.0);
        ledger
            .execute_trade(&market, &Symbol::new("NOK"), TradeAction::Buy, 250)
            .unwrap();

        let snapshot = PortfolioSnapshot::capture(&ledger, &market);

        assert_eq!(snapshot.shares("NOK"), 250);
        assert_eq!(snapshot.shares("RTX"), 0);
        assert_eq!(snapshot.portfolio_value, ledger.portfolio_value(&market));
        assert_eq!(snapshot.total_value, snapshot.cash + snapshot.portfolio_value);
        assert_eq!(snapshot.stats.buy_orders, 1);
        assert!(!snapshot.holds_every_instrument());
    }

    #[test]
    fn holds_every_instrument_requires_each_position() {
        let market = market();
        let mut ledger = PortfolioLedger::new(10_000.0);
        ledger
            .execute_trade(&market, &Symbol::new("NOK"), TradeAction::Buy, 1)
            .unwrap();
        ledger
            .execute_trade(&market, &Symbol::new("RTX"), TradeAction::Buy, 1)
            .unwrap();

        assert!(PortfolioSnapshot::capture(&ledger, &market).holds_every_instrument());
    }

    #[test]
    fn snapshot_carries_open_candle_in_series() {
        let market = market();
        let ledger = PortfolioLedger::new(10_000.0);

        let snapshot = Snapshot::capture(3, &ledger, &market);

        assert_eq!(snapshot.tick, 3);
        let rtx = snapshot.instrument("RTX").unwrap();
        assert_eq!(rtx.candles.len(), 1);
        assert_eq!(rtx.change, 0.0);
    }
}
