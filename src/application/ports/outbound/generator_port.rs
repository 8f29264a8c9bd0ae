//! Character generator port - AI-generated identities, rosters, and artwork

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::entities::WarriorOption;

/// A generated enemy identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyIdentity {
    pub name: String,
    /// Flavor descriptor woven into the artwork prompt.
    pub kind: String,
}

/// Generates selectable heroes, the enemy identity, and character artwork.
#[async_trait]
pub trait CharacterGeneratorPort: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Generate artwork for a prompt. `Ok(None)` means the service answered
    /// but produced nothing; callers substitute a deterministic placeholder
    /// URI in that case.
    async fn generate_character_image(&self, prompt: &str)
        -> Result<Option<String>, Self::Error>;

    async fn generate_enemy_identity(&self) -> Result<EnemyIdentity, Self::Error>;

    /// Generate one small batch of warrior options. The batch is consumed
    /// whole when the player selects one.
    async fn generate_warrior_options(&self) -> Result<Vec<WarriorOption>, Self::Error>;
}
