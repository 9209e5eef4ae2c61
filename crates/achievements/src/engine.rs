use core_sim::{PortfolioSnapshot, TradeStats};
use serde::{Deserialize, Serialize};

use crate::catalog::{catalog, Achievement, AchievementId};

/// Facts the ledger and market cannot see on their own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signals {
    /// The clock is currently at its top speed.
    pub max_speed_selected: bool,
    /// The trade being evaluated spent at least 90% of the cash on hand.
    pub large_commitment: bool,
}

impl Signals {
    pub fn with_max_speed(self, max_speed_selected: bool) -> Self {
        Self {
            max_speed_selected,
            ..self
        }
    }

    pub fn with_large_commitment(self, large_commitment: bool) -> Self {
        Self {
            large_commitment,
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub portfolio: &'a PortfolioSnapshot,
    pub signals: Signals,
}

impl<'a> EvalContext<'a> {
    pub fn new(portfolio: &'a PortfolioSnapshot, signals: Signals) -> Self {
        Self { portfolio, signals }
    }

    pub fn stats(&self) -> &TradeStats {
        &self.portfolio.stats
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub unlocked: usize,
    pub total: usize,
}

impl Progress {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.unlocked as f64 / self.total as f64 * 100.0
    }
}

/// Catalog row paired with its unlock state, for badge rendering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub achievement: Achievement,
    pub unlocked: bool,
}

#[derive(Debug, Clone)]
pub struct AchievementEngine {
    definitions: Vec<Achievement>,
    unlocked: Vec<AchievementId>,
}

impl Default for AchievementEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AchievementEngine {
    pub fn new() -> Self {
        Self::with_catalog(catalog())
    }

    /// Builds an engine over a custom rule list. Later duplicates of an id are dropped.
    pub fn with_catalog(definitions: Vec<Achievement>) -> Self {
        let mut unique: Vec<Achievement> = Vec::with_capacity(definitions.len());
        for definition in definitions {
            if unique.iter().any(|d| d.id == definition.id) {
                tracing::warn!(id = %definition.id, "duplicate achievement definition ignored");
                continue;
            }
            unique.push(definition);
        }

        Self {
            definitions: unique,
            unlocked: Vec::new(),
        }
    }

    /// Runs every locked rule in catalog order and returns the ones that
    /// unlocked on this call.
    pub fn evaluate(&mut self, ctx: &EvalContext<'_>) -> Vec<Achievement> {
        let mut fresh = Vec::new();
        for definition in &self.definitions {
            if self.unlocked.contains(&definition.id) || !definition.is_met(ctx) {
                continue;
            }
            self.unlocked.push(definition.id);
            tracing::info!(
                id = %definition.id,
                rarity = definition.rarity.as_str(),
                "achievement unlocked"
            );
            fresh.push(*definition);
        }
        fresh
    }

    pub fn is_unlocked(&self, id: AchievementId) -> bool {
        self.unlocked.contains(&id)
    }

    /// Unlocked ids in the order they were earned.
    pub fn unlocked(&self) -> &[AchievementId] {
        &self.unlocked
    }

    pub fn get(&self, id: AchievementId) -> Option<&Achievement> {
        self.definitions.iter().find(|d| d.id == id)
    }

    pub fn progress(&self) -> Progress {
        Progress {
            unlocked: self.unlocked.len(),
            total: self.definitions.len(),
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = CatalogEntry> + '_ {
        self.definitions.iter().map(|achievement| CatalogEntry {
            achievement: *achievement,
            unlocked: self.is_unlocked(achievement.id),
        })
    }

    pub fn reset(&mut self) {
        self.unlocked.clear();
    }
}
