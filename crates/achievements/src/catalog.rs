use std::fmt;

use serde::{Deserialize, Serialize};

use crate::engine::EvalContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementId {
    FirstTrade,
    #[serde(rename = "buy_10")]
    Buy10,
    #[serde(rename = "sell_10")]
    Sell10,
    #[serde(rename = "profit_100")]
    Profit100,
    #[serde(rename = "profit_500")]
    Profit500,
    #[serde(rename = "profit_1000")]
    Profit1000,
    #[serde(rename = "profit_5000")]
    Profit5000,
    Diversified,
    RtxFan,
    NokFan,
    SpeedDemon,
    DayTrader,
    DiamondHands,
    PaperHands,
    ComebackKid,
    AllIn,
    DoubleUp,
    Broke,
    PennyPincher,
    WarProfiteer,
}

impl AchievementId {
    pub const ALL: [AchievementId; 20] = [
        Self::FirstTrade,
        Self::Buy10,
        Self::Sell10,
        Self::Profit100,
        Self::Profit500,
        Self::Profit1000,
        Self::Profit5000,
        Self::Diversified,
        Self::RtxFan,
        Self::NokFan,
        Self::SpeedDemon,
        Self::DayTrader,
        Self::DiamondHands,
        Self::PaperHands,
        Self::ComebackKid,
        Self::AllIn,
        Self::DoubleUp,
        Self::Broke,
        Self::PennyPincher,
        Self::WarProfiteer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FirstTrade => "first_trade",
            Self::Buy10 => "buy_10",
            Self::Sell10 => "sell_10",
            Self::Profit100 => "profit_100",
            Self::Profit500 => "profit_500",
            Self::Profit1000 => "profit_1000",
            Self::Profit5000 => "profit_5000",
            Self::Diversified => "diversified",
            Self::RtxFan => "rtx_fan",
            Self::NokFan => "nok_fan",
            Self::SpeedDemon => "speed_demon",
            Self::DayTrader => "day_trader",
            Self::DiamondHands => "diamond_hands",
            Self::PaperHands => "paper_hands",
            Self::ComebackKid => "comeback_kid",
            Self::AllIn => "all_in",
            Self::DoubleUp => "double_up",
            Self::Broke => "broke",
            Self::PennyPincher => "penny_pincher",
            Self::WarProfiteer => "war_profiteer",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.as_str() == value)
    }
}

impl fmt::Display for AchievementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Rare,
    Legendary,
}

impl Rarity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Rare => "rare",
            Self::Legendary => "legendary",
        }
    }
}

pub type Predicate = fn(&EvalContext<'_>) -> bool;

/// A catalog entry: display metadata plus the rule that unlocks it.
#[derive(Clone, Copy, Serialize)]
pub struct Achievement {
    pub id: AchievementId,
    pub name: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
    pub rarity: Rarity,
    #[serde(skip)]
    pub predicate: Predicate,
}

impl Achievement {
    pub fn is_met(&self, ctx: &EvalContext<'_>) -> bool {
        (self.predicate)(ctx)
    }
}

impl fmt::Debug for Achievement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Achievement")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("rarity", &self.rarity)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Achievement {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

const RTX: &str = "RTX";
const NOK: &str = "NOK";

fn entry(
    id: AchievementId,
    name: &'static str,
    icon: &'static str,
    description: &'static str,
    rarity: Rarity,
    predicate: Predicate,
) -> Achievement {
    Achievement {
        id,
        name,
        icon,
        description,
        rarity,
        predicate,
    }
}

/// The default achievement list, in evaluation order.
pub fn catalog() -> Vec<Achievement> {
    use AchievementId as Id;
    use Rarity::{Common, Legendary, Rare};

    vec![
        entry(Id::FirstTrade, "First Steps", "🎯", "Make your first trade", Common, |c| {
            c.stats().total_trades >= 1
        }),
        entry(Id::Buy10, "Buyer", "🛒", "Complete 10 buy orders", Common, |c| {
            c.stats().buy_orders >= 10
        }),
        entry(Id::Sell10, "Seller", "💰", "Complete 10 sell orders", Common, |c| {
            c.stats().sell_orders >= 10
        }),
        entry(Id::Profit100, "Pocket Change", "💵", "Earn $100 profit", Common, |c| {
            c.portfolio.profit >= 100.0
        }),
        entry(Id::Profit500, "Making Bank", "💸", "Earn $500 profit", Common, |c| {
            c.portfolio.profit >= 500.0
        }),
        entry(Id::Profit1000, "Big Money", "🤑", "Earn $1,000 profit", Rare, |c| {
            c.portfolio.profit >= 1_000.0
        }),
        entry(Id::Profit5000, "Whale", "🐋", "Earn $5,000 profit", Legendary, |c| {
            c.portfolio.profit >= 5_000.0
        }),
        entry(Id::Diversified, "Diversified", "📊", "Own every listed stock", Common, |c| {
            c.portfolio.holds_every_instrument()
        }),
        entry(Id::RtxFan, "Defense Buff", "🛡️", "Own 20+ RTX shares", Common, |c| {
            c.portfolio.shares(RTX) >= 20
        }),
        entry(Id::NokFan, "5G Believer", "📡", "Own 500+ NOK shares", Common, |c| {
            c.portfolio.shares(NOK) >= 500
        }),
        entry(Id::SpeedDemon, "Speed Demon", "⚡", "Use 5x speed", Common, |c| {
            c.signals.max_speed_selected
        }),
        entry(Id::DayTrader, "Day Trader", "📈", "Make 25 trades", Rare, |c| {
            c.stats().total_trades >= 25
        }),
        entry(Id::DiamondHands, "Diamond Hands", "💎", "Hold through a 10% drop", Rare, |c| {
            c.portfolio.portfolio_value > 0.0 && c.portfolio.profit_pct <= -10.0
        }),
        entry(Id::PaperHands, "Paper Hands", "📄", "Sell everything during a dip", Common, |c| {
            c.portfolio.portfolio_value == 0.0
                && c.stats().total_trades > 0
                && c.portfolio.profit_pct < 0.0
        }),
        entry(
            Id::ComebackKid,
            "Comeback Kid",
            "🔥",
            "Recover from 20% loss to profit",
            Legendary,
            |c| c.stats().was_down_20 && c.portfolio.profit > 0.0,
        ),
        entry(Id::AllIn, "YOLO", "🎰", "Spend 90%+ of cash in one trade", Rare, |c| {
            c.signals.large_commitment
        }),
        entry(Id::DoubleUp, "Double Up", "✌️", "Reach $20,000 total value", Legendary, |c| {
            c.portfolio.total_value >= 20_000.0
        }),
        entry(Id::Broke, "Broke", "😭", "Have less than $100 total value", Rare, |c| {
            c.portfolio.total_value < 100.0 && c.stats().total_trades > 0
        }),
        entry(Id::PennyPincher, "Penny Pincher", "🪙", "Own 1000+ NOK shares", Rare, |c| {
            c.portfolio.shares(NOK) >= 1_000
        }),
        entry(Id::WarProfiteer, "War Profiteer", "🚀", "Own 50+ RTX shares", Rare, |c| {
            c.portfolio.shares(RTX) >= 50
        }),
    ]
}
