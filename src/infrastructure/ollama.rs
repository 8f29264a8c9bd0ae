//! Ollama client - turn outcomes, enemy identities, and warrior rosters
//! from an OpenAI-compatible chat endpoint
//!
//! All calls request JSON-object responses and parse them defensively: the
//! model is free-text at heart, so every numeric field is clamped and every
//! string gets a fallback before the result crosses the port boundary.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::application::ports::outbound::{
    EnemyIdentity, OutcomeProviderPort, TurnOutcome,
};
use crate::domain::entities::{Character, WarriorOption};

/// Client for an Ollama server speaking the OpenAI chat API.
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    /// One chat completion constrained to a JSON object.
    async fn chat_json(
        &self,
        system: &str,
        user: &str,
    ) -> Result<serde_json::Value, OllamaError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            temperature: 0.8,
            response_format: ResponseFormat {
                format_type: "json_object".to_string(),
            },
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(OllamaError::ApiError(error_text));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(OllamaError::EmptyResponse)?;

        Ok(serde_json::from_str(&content)?)
    }

    /// Generate a name and flavor descriptor for the boss.
    pub async fn generate_enemy_identity(&self) -> Result<EnemyIdentity, OllamaError> {
        let system = "You invent menacing dragon bosses for a retro RPG. \
                      Respond with a JSON object: \
                      {\"name\": string, \"type\": string} where type is a \
                      two or three word elemental descriptor.";
        let value = self
            .chat_json(system, "Invent one new dragon boss.")
            .await?;
        Ok(parse_enemy_identity(value))
    }

    /// Generate one batch of selectable heroes.
    pub async fn generate_warrior_options(&self) -> Result<Vec<WarriorOption>, OllamaError> {
        let system = "You recruit heroes for a retro dice battle RPG. \
                      Respond with a JSON object: {\"warriors\": [{\"name\": \
                      string, \"classType\": string, \"description\": string}]} \
                      containing exactly 3 distinct warriors. Descriptions are \
                      one short evocative sentence.";
        let value = self
            .chat_json(system, "Recruit a fresh batch of 3 warriors.")
            .await?;
        let options = parse_warrior_options(value);
        if options.is_empty() {
            return Err(OllamaError::EmptyResponse);
        }
        Ok(options)
    }

    fn outcome_system_prompt(&self, dice_max: u32) -> String {
        let mut prompt = String::new();
        prompt.push_str(
            "You are the referee and narrator of a turn-based dice battle \
             between a hero and a dragon boss.\n\n",
        );
        prompt.push_str(&format!(
            "The hero rolled a d{dice_max}. Judge the exchange:\n\
             - A roll of {dice_max} is a devastating critical hit.\n\
             - High rolls deal solid damage to the enemy and draw weak retaliation.\n\
             - Low rolls miss (zero damage) and invite a punishing counter.\n\
             - \"Defend\" trades damage output for a softened counter.\n\
             - \"Hesitate\" means the hero froze: no damage dealt, full retaliation.\n\n",
        ));
        prompt.push_str(
            "Respond with a JSON object only:\n\
             {\"narrative\": string (one vivid sentence, second person),\n \
             \"damageToEnemy\": integer >= 0,\n \
             \"damageToPlayer\": integer >= 0,\n \
             \"isCritical\": boolean,\n \
             \"enemyActionName\": string (the dragon's counterattack name)}",
        );
        prompt
    }

    fn outcome_user_prompt(
        &self,
        player: &Character,
        enemy: &Character,
        action: &str,
        roll: u32,
        dice_max: u32,
    ) -> String {
        let mut prompt = String::new();
        prompt.push_str(&format!(
            "HERO: {} (level {} {})\n",
            player.name,
            player.level,
            player.class_type.as_deref().unwrap_or("Adventurer")
        ));
        prompt.push_str(&format!("HERO HP: {}/{}\n", player.hp, player.max_hp));
        prompt.push_str(&format!("ENEMY: {} (level {})\n", enemy.name, enemy.level));
        prompt.push_str(&format!("ENEMY HP: {}/{}\n\n", enemy.hp, enemy.max_hp));
        prompt.push_str(&format!("ACTION: {action}\n"));
        prompt.push_str(&format!("ROLL: {roll} of {dice_max}\n"));
        prompt
    }
}

#[async_trait]
impl OutcomeProviderPort for OllamaClient {
    type Error = OllamaError;

    async fn generate_turn_outcome(
        &self,
        player: &Character,
        enemy: &Character,
        action: &str,
        roll: u32,
        dice_max: u32,
    ) -> Result<TurnOutcome, Self::Error> {
        let system = self.outcome_system_prompt(dice_max);
        let user = self.outcome_user_prompt(player, enemy, action, roll, dice_max);
        let value = self.chat_json(&system, &user).await?;
        Ok(parse_turn_outcome(value))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OllamaError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("model returned no usable content")]
    EmptyResponse,
    #[error("model returned malformed JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawTurnOutcome {
    narrative: String,
    damage_to_enemy: i64,
    damage_to_player: i64,
    is_critical: bool,
    enemy_action_name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawEnemyIdentity {
    name: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawWarriorBatch {
    warriors: Vec<RawWarrior>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawWarrior {
    name: String,
    class_type: String,
    description: String,
}

/// Negative or absent damage becomes 0; damage values must be usable
/// directly as non-negative integers downstream.
fn clamp_damage(value: i64) -> u32 {
    value.clamp(0, u32::MAX as i64) as u32
}

fn non_empty(value: String, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value
    }
}

fn parse_turn_outcome(value: serde_json::Value) -> TurnOutcome {
    let raw: RawTurnOutcome = serde_json::from_value(value).unwrap_or_default();
    TurnOutcome {
        narrative: non_empty(raw.narrative, "The clash echoes across the arena."),
        damage_to_enemy: clamp_damage(raw.damage_to_enemy),
        damage_to_player: clamp_damage(raw.damage_to_player),
        is_critical: raw.is_critical,
        enemy_action_name: non_empty(raw.enemy_action_name, "Strike"),
    }
}

fn parse_enemy_identity(value: serde_json::Value) -> EnemyIdentity {
    let raw: RawEnemyIdentity = serde_json::from_value(value).unwrap_or_default();
    EnemyIdentity {
        name: non_empty(raw.name, "Dragon"),
        kind: non_empty(raw.kind, "ancient fire"),
    }
}

fn parse_warrior_options(value: serde_json::Value) -> Vec<WarriorOption> {
    let raw: RawWarriorBatch = serde_json::from_value(value).unwrap_or_default();
    raw.warriors
        .into_iter()
        .filter(|w| !w.name.trim().is_empty())
        .map(|w| {
            WarriorOption::new(
                w.name,
                non_empty(w.class_type, "Warrior"),
                w.description,
            )
        })
        .collect()
}
