use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{instrument::Symbol, market::Market};

/// Share of pre-trade cash at or above which a buy counts as a large commitment.
pub const LARGE_COMMITMENT_RATIO: f64 = 0.9;

/// Drawdown (in percent of starting cash) that latches `was_down_20`.
pub const DEEP_DRAWDOWN_PCT: f64 = -20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl TradeAction {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "buy" => Some(Self::Buy),
            "sell" => Some(Self::Sell),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TradeError {
    #[error("insufficient funds to buy {quantity} {symbol}: cost ${cost:.2} exceeds cash ${cash:.2}")]
    InsufficientFunds {
        symbol: Symbol,
        quantity: u64,
        cost: f64,
        cash: f64,
    },

    #[error("not enough {symbol} shares to sell: requested {requested}, held {held}")]
    InsufficientHoldings {
        symbol: Symbol,
        requested: u64,
        held: u64,
    },

    #[error("invalid quantity '{0}': must be a positive whole number")]
    InvalidQuantity(String),

    #[error("unknown symbol '{0}'")]
    UnknownSymbol(Symbol),
}

/// Parses a user-entered order quantity. Zero, negatives and fractions are rejected.
pub fn parse_quantity(input: &str) -> Result<u64, TradeError> {
    let trimmed = input.trim();
    match u64::from_str(trimmed) {
        Ok(quantity) if quantity > 0 => Ok(quantity),
        _ => Err(TradeError::InvalidQuantity(trimmed.to_owned())),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeStats {
    pub total_trades: u64,
    pub buy_orders: u64,
    pub sell_orders: u64,
    pub max_profit: f64,
    /// Lowest profit seen, i.e. the deepest loss.
    pub min_profit: f64,
    pub was_down_20: bool,
}

impl TradeStats {
    pub fn observe(&mut self, profit: f64, profit_pct: f64) {
        self.max_profit = self.max_profit.max(profit);
        self.min_profit = self.min_profit.min(profit);
        if profit_pct <= DEEP_DRAWDOWN_PCT {
            self.was_down_20 = true;
        }
    }

    fn record(&mut self, action: TradeAction) {
        match action {
            TradeAction::Buy => self.buy_orders += 1,
            TradeAction::Sell => self.sell_orders += 1,
        }
        self.total_trades += 1;
    }
}

/// A completed, all-or-nothing trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeFill {
    pub symbol: Symbol,
    pub action: TradeAction,
    pub quantity: u64,
    pub price: f64,
    pub notional: f64,
    /// Buy that spent at least 90% of the cash on hand.
    pub large_commitment: bool,
}

impl fmt::Display for TradeFill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self.action {
            TradeAction::Buy => "Bought",
            TradeAction::Sell => "Sold",
        };
        write!(
            f,
            "{verb} {} {} @ ${:.2} = ${:.2}",
            self.quantity, self.symbol, self.price, self.notional
        )
    }
}

/// Cash, share holdings and trade statistics for one session.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioLedger {
    cash: f64,
    starting_cash: f64,
    holdings: BTreeMap<Symbol, u64>,
    stats: TradeStats,
}

impl PortfolioLedger {
    pub fn new(starting_cash: f64) -> Self {
        assert!(
            starting_cash.is_finite() && starting_cash > 0.0,
            "starting_cash must be finite and positive"
        );

        Self {
            cash: starting_cash,
            starting_cash,
            holdings: BTreeMap::new(),
            stats: TradeStats::default(),
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn starting_cash(&self) -> f64 {
        self.starting_cash
    }

    pub fn stats(&self) -> &TradeStats {
        &self.stats
    }

    pub fn holding(&self, symbol: &Symbol) -> u64 {
        self.holdings.get(symbol).copied().unwrap_or(0)
    }

    pub fn execute_trade(
        &mut self,
        market: &Market,
        symbol: &Symbol,
        action: TradeAction,
        quantity: u64,
    ) -> Result<TradeFill, TradeError> {
        if quantity == 0 {
            return Err(TradeError::InvalidQuantity(quantity.to_string()));
        }
        let price = market
            .price(symbol)
            .ok_or_else(|| TradeError::UnknownSymbol(symbol.clone()))?;
        let notional = price * quantity as f64;

        let large_commitment = match action {
            TradeAction::Buy => {
                if notional > self.cash {
                    return Err(TradeError::InsufficientFunds {
                        symbol: symbol.clone(),
                        quantity,
                        cost: notional,
                        cash: self.cash,
                    });
                }
                let large_commitment = notional >= self.cash * LARGE_COMMITMENT_RATIO;
                self.cash = (self.cash - notional).max(0.0);
                *self.holdings.entry(symbol.clone()).or_insert(0) += quantity;
                large_commitment
            }
            TradeAction::Sell => {
                let held = self.holding(symbol);
                if quantity > held {
                    return Err(TradeError::InsufficientHoldings {
                        symbol: symbol.clone(),
                        requested: quantity,
                        held,
                    });
                }
                self.cash += notional;
                self.holdings.insert(symbol.clone(), held - quantity);
                false
            }
        };
        self.stats.record(action);

        Ok(TradeFill {
            symbol: symbol.clone(),
            action,
            quantity,
            price,
            notional,
            large_commitment,
        })
    }

    pub fn instrument_value(&self, market: &Market, symbol: &Symbol) -> f64 {
        let price = market.price(symbol).unwrap_or(0.0);
        self.holding(symbol) as f64 * price
    }

    pub fn portfolio_value(&self, market: &Market) -> f64 {
        market
            .symbols()
            .map(|symbol| self.instrument_value(market, symbol))
            .sum()
    }

    pub fn total_value(&self, market: &Market) -> f64 {
        self.cash + self.portfolio_value(market)
    }

    pub fn profit(&self, market: &Market) -> f64 {
        self.total_value(market) - self.starting_cash
    }

    pub fn profit_pct(&self, market: &Market) -> f64 {
        self.profit(market) / self.starting_cash * 100.0
    }

    /// Folds the current valuation into the running profit extremes and the
    /// drawdown latch. Call before every achievement evaluation.
    pub fn observe_valuation(&mut self, market: &Market) {
        let profit = self.profit(market);
        let profit_pct = profit / self.starting_cash * 100.0;
        self.stats.observe(profit, profit_pct);
    }

    pub fn reset(&mut self) {
        self.cash = self.starting_cash;
        self.holdings.clear();
        self.stats = TradeStats::default();
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{parse_quantity, PortfolioLedger, TradeAction, TradeError, TradeStats};
    use crate::{
        instrument::{InstrumentSpec, Symbol},
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

    fn rtx() -> Symbol {
        Symbol::new("RTX")
    }

    fn nok() -> Symbol {
        Symbol::new("NOK")
    }

    fn approx(left: f64, right: f64) -> bool {
        (left - right).abs() < 1e-6
    }

    #[test]
    fn buy_debits_cash_and_credits_holding() {
        let market = market();
        let mut ledger = PortfolioLedger::new(10_000.0);

        let fill = ledger
            .execute_trade(&market, &rtx(), TradeAction::Buy, 10)
            .unwrap();

        assert!(approx(ledger.cash(), 8_148.0));
        assert_eq!(ledger.holding(&rtx()), 10);
        assert_eq!(ledger.stats().buy_orders, 1);
        assert_eq!(ledger.stats().total_trades, 1);
        assert!(approx(fill.notional, 1_852.0));
        assert!(!fill.large_commitment);
        assert_eq!(fill.to_string(), "Bought 10 RTX @ $185.20 = $1852.00");
    }

    #[test]
    fn buy_exceeding_cash_is_rejected_without_side_effects() {
        let market = market();
        let mut ledger = PortfolioLedger::new(1_000.0);

        let err = ledger
            .execute_trade(&market, &rtx(), TradeAction::Buy, 6)
            .unwrap_err();

        assert!(matches!(err, TradeError::InsufficientFunds { quantity: 6, .. }));
        assert_eq!(ledger.cash(), 1_000.0);
        assert_eq!(ledger.holding(&rtx()), 0);
        assert_eq!(ledger.stats().total_trades, 0);
    }

    #[test]
    fn sell_more_than_held_is_rejected_without_side_effects() {
        let market = market();
        let mut ledger = PortfolioLedger::new(10_000.0);
        ledger
            .execute_trade(&market, &rtx(), TradeAction::Buy, 10)
            .unwrap();
        let before = ledger.clone();

        let err = ledger
            .execute_trade(&market, &rtx(), TradeAction::Sell, 15)
            .unwrap_err();

        assert_eq!(
            err,
            TradeError::InsufficientHoldings {
                symbol: rtx(),
                requested: 15,
                held: 10,
            }
        );
        assert_eq!(ledger, before);
    }

    #[test]
    fn sell_credits_cash_and_counts_order() {
        let market = market();
        let mut ledger = PortfolioLedger::new(10_000.0);
        ledger
            .execute_trade(&market, &nok(), TradeAction::Buy, 100)
            .unwrap();

        ledger
            .execute_trade(&market, &nok(), TradeAction::Sell, 40)
            .unwrap();

        assert_eq!(ledger.holding(&nok()), 60);
        assert!(approx(ledger.cash(), 10_000.0 - 60.0 * 6.40));
        assert_eq!(ledger.stats().sell_orders, 1);
        assert_eq!(ledger.stats().total_trades, 2);
    }

    #[test]
    fn buy_of_ninety_percent_of_cash_is_a_large_commitment() {
        let market = market();
        let mut ledger = PortfolioLedger::new(10_000.0);

        // 1 407 * 6.40 = 9 004.80
        let fill = ledger
            .execute_trade(&market, &nok(), TradeAction::Buy, 1_407)
            .unwrap();

        assert!(fill.large_commitment);
    }

    #[test]
    fn zero_quantity_and_unknown_symbol_are_rejected() {
        let market = market();
        let mut ledger = PortfolioLedger::new(10_000.0);

        assert!(matches!(
            ledger.execute_trade(&market, &rtx(), TradeAction::Buy, 0),
            Err(TradeError::InvalidQuantity(_))
        ));
        assert_eq!(
            ledger.execute_trade(&market, &Symbol::new("LMT"), TradeAction::Buy, 1),
            Err(TradeError::UnknownSymbol(Symbol::new("LMT")))
        );
    }

    #[test]
    fn parse_quantity_rejects_non_positive_and_fractional_input() {
        assert_eq!(parse_quantity(" 25 "), Ok(25));
        assert!(parse_quantity("0").is_err());
        assert!(parse_quantity("-3").is_err());
        assert!(parse_quantity("2.5").is_err());
        assert!(parse_quantity("ten").is_err());
    }

    #[test]
    fn trade_action_parses_case_insensitively() {
        assert_eq!(TradeAction::parse("BUY"), Some(TradeAction::Buy));
        assert_eq!(TradeAction::parse("sell"), Some(TradeAction::Sell));
        assert_eq!(TradeAction::parse("short"), None);
    }

    #[test]
    fn derived_values_follow_prices() {
        let mut market = market();
        let mut ledger = PortfolioLedger::new(10_000.0);
        ledger
            .execute_trade(&market, &rtx(), TradeAction::Buy, 10)
            .unwrap();
        ledger
            .execute_trade(&market, &nok(), TradeAction::Buy, 100)
            .unwrap();

        market.get_mut(&rtx()).unwrap().set_price_for_test(200.0);

        assert!(approx(ledger.instrument_value(&market, &rtx()), 2_000.0));
        assert!(approx(ledger.portfolio_value(&market), 2_640.0));
        assert!(approx(
            ledger.total_value(&market),
            ledger.cash() + 2_640.0
        ));
        assert!(approx(ledger.profit(&market), 148.0));
        assert!(approx(ledger.profit_pct(&market), 1.48));
    }

    #[test]
    fn drawdown_latch_survives_recovery_until_reset() {
        let mut market = market();
        let mut ledger = PortfolioLedger::new(10_000.0);
        ledger
            .execute_trade(&market, &rtx(), TradeAction::Buy, 50)
            .unwrap();

        market.get_mut(&rtx()).unwrap().set_price_for_test(140.0);
        ledger.observe_valuation(&market);
        assert!(ledger.stats().was_down_20);
        assert!(approx(ledger.stats().min_profit, -2_260.0));

        market.get_mut(&rtx()).unwrap().set_price_for_test(190.0);
        ledger.observe_valuation(&market);
        assert!(ledger.stats().was_down_20);
        assert!(approx(ledger.stats().max_profit, 240.0));

        ledger.reset();
        assert_eq!(ledger.cash(), 10_000.0);
        assert_eq!(ledger.holding(&rtx()), 0);
        assert_eq!(*ledger.stats(), TradeStats::default());
    }

    proptest! {
        #[test]
        fn random_trades_keep_cash_and_holdings_non_negative(
            orders in proptest::collection::vec((any::<bool>(), any::<bool>(), 1u64..2_000), 1..60)
        ) {
            let market = market();
            let mut ledger = PortfolioLedger::new(10_000.0);

            for (is_buy, is_rtx, quantity) in orders {
                let symbol = if is_rtx { rtx() } else { nok() };
                let action = if is_buy { TradeAction::Buy } else { TradeAction::Sell };
                let before = ledger.clone();

                if ledger.execute_trade(&market, &symbol, action, quantity).is_err() {
                    prop_assert_eq!(&ledger, &before);
                }
                prop_assert!(ledger.cash() >= 0.0);

                let expected_total = ledger.cash()
                    + ledger.holding(&rtx()) as f64 * 185.20
                    + ledger.holding(&nok()) as f64 * 6.40;
                prop_assert!((ledger.total_value(&market) - expected_total).abs() < 1e-6);
            }
        }
    }
}
