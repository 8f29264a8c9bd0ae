//! Application services - Use case implementations
//!
//! Each service follows hexagonal architecture principles: generic over the
//! outbound ports it needs, with the battle state as the only shared data.

pub mod battle_service;
pub mod turn_resolution_service;

pub use battle_service::{BattleError, BattleService};
pub use turn_resolution_service::{TurnResolutionService, TurnTimings};
