//! Character generator adapter - composes the LLM and ComfyUI clients into
//! the single generator port the application sees

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::ports::outbound::{CharacterGeneratorPort, EnemyIdentity};
use crate::domain::entities::WarriorOption;
use crate::infrastructure::comfyui::{ComfyUIClient, ComfyUIError};
use crate::infrastructure::ollama::{OllamaClient, OllamaError};

/// Identities and rosters come from Ollama; artwork comes from ComfyUI.
pub struct AiCharacterGenerator {
    llm: Arc<OllamaClient>,
    comfyui: Arc<ComfyUIClient>,
}

impl AiCharacterGenerator {
    pub fn new(llm: Arc<OllamaClient>, comfyui: Arc<ComfyUIClient>) -> Self {
        Self { llm, comfyui }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("LLM generation failed: {0}")]
    Llm(#[from] OllamaError),
    #[error("image generation failed: {0}")]
    Image(#[from] ComfyUIError),
}

#[async_trait]
impl CharacterGeneratorPort for AiCharacterGenerator {
    type Error = GeneratorError;

    async fn generate_character_image(
        &self,
        prompt: &str,
    ) -> Result<Option<String>, Self::Error> {
        Ok(self.comfyui.generate_image(prompt).await?)
    }

    async fn generate_enemy_identity(&self) -> Result<EnemyIdentity, Self::Error> {
        Ok(self.llm.generate_enemy_identity().await?)
    }

    async fn generate_warrior_options(&self) -> Result<Vec<WarriorOption>, Self::Error> {
        Ok(self.llm.generate_warrior_options().await?)
    }
}
