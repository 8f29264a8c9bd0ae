//! Outcome provider port - the external AI collaborator that decides what a
//! turn does

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::entities::Character;

/// The provider's verdict on one exchange of blows.
///
/// Created once per turn, consumed synchronously by turn resolution and not
/// retained. Damage values are guaranteed non-negative; adapters clamp
/// whatever the model returns before it gets here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnOutcome {
    /// Narrative text describing the exchange.
    pub narrative: String,
    pub damage_to_enemy: u32,
    pub damage_to_player: u32,
    pub is_critical: bool,
    /// Name of the move the enemy retaliates with.
    pub enemy_action_name: String,
}

impl TurnOutcome {
    /// Deterministic fallback used when the provider stays unreachable
    /// after a retry: the whole exchange whiffs and the battle carries on.
    pub fn missed_exchange() -> Self {
        Self {
            narrative: "Both fighters circle warily; neither lands a blow.".to_string(),
            damage_to_enemy: 0,
            damage_to_player: 0,
            is_critical: false,
            enemy_action_name: "Feint".to_string(),
        }
    }
}

/// Computes the outcome of a player action against the enemy.
///
/// Implementations must tolerate arbitrary free-text actions, including the
/// synthetic "Hesitate" submitted when the round timer expires.
#[async_trait]
pub trait OutcomeProviderPort: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn generate_turn_outcome(
        &self,
        player: &Character,
        enemy: &Character,
        action: &str,
        roll: u32,
        dice_max: u32,
    ) -> Result<TurnOutcome, Self::Error>;
}
