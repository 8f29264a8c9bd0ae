//! Domain layer - Core battle logic with no external dependencies
//!
//! This layer contains:
//! - Entities: Character, CombatLog, BattleState
//! - Value Objects: GamePhase, animation cues, typed identifiers

pub mod entities;
pub mod value_objects;
