//! Value objects - Immutable objects defined by their attributes

mod animation;
mod ids;
mod phase;

pub use animation::{enemy_hit_weight, player_hit_weight, AnimationCue, HitWeight, Side};
pub use ids::*;
pub use phase::{GamePhase, PhaseError};
