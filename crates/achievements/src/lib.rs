mod catalog;
mod engine;

pub use catalog::{catalog, Achievement, AchievementId, Predicate, Rarity};
pub use engine::{AchievementEngine, CatalogEntry, EvalContext, Progress, Signals};
