//! Domain entities - Core battle objects with identity

mod battle;
mod character;
mod combat_log;

pub use battle::{BattleRules, BattleState};
pub use character::{Character, WarriorOption};
pub use combat_log::{CombatLog, LogEntry, LogKind};
