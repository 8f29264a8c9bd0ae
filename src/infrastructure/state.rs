//! Shared application state

use std::sync::Arc;

use crate::application::services::{BattleService, TurnTimings};
use crate::domain::entities::BattleRules;
use crate::infrastructure::clock::TokioClock;
use crate::infrastructure::comfyui::ComfyUIClient;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::generator::AiCharacterGenerator;
use crate::infrastructure::ollama::OllamaClient;

/// The concrete battle service wired to the real AI clients and clock.
pub type EngineBattle = BattleService<OllamaClient, AiCharacterGenerator, TokioClock>;

/// Shared application state
pub struct AppState {
    pub config: AppConfig,
    llm_client: Arc<OllamaClient>,
    comfyui_client: Arc<ComfyUIClient>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let llm_client = Arc::new(OllamaClient::new(
            &config.ollama_base_url,
            &config.ollama_model,
        ));
        let comfyui_client = Arc::new(ComfyUIClient::new(&config.comfyui_base_url));
        Self {
            config,
            llm_client,
            comfyui_client,
        }
    }

    /// Create a fresh battle for a newly connected client. Process lifetime
    /// is one browser session: the battle dies with its connection.
    pub fn new_battle(&self) -> Arc<EngineBattle> {
        let generator = Arc::new(AiCharacterGenerator::new(
            self.llm_client.clone(),
            self.comfyui_client.clone(),
        ));
        Arc::new(BattleService::new(
            self.llm_client.clone(),
            generator,
            Arc::new(TokioClock),
            BattleRules::default(),
            TurnTimings::default(),
        ))
    }
}
