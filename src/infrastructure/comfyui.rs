//! ComfyUI client for AI character artwork

use reqwest::Client;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How many times to poll for a finished prompt before giving up.
const MAX_POLLS: u32 = 60;
/// Pause between polls.
const POLL_INTERVAL: std::time::Duration = std::time::Duration::from_secs(1);

/// Client for the ComfyUI API.
pub struct ComfyUIClient {
    client: Client,
    base_url: String,
}

impl ComfyUIClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Generate one image for `prompt` and return a URI the browser can
    /// load directly from the ComfyUI server. `Ok(None)` means the
    /// workflow finished without producing an image, or did not finish
    /// within the polling window; callers fall back to a placeholder.
    pub async fn generate_image(&self, prompt: &str) -> Result<Option<String>, ComfyUIError> {
        let workflow = character_workflow(prompt);
        let queued = self.queue_prompt(workflow).await?;
        tracing::debug!("queued ComfyUI prompt {}", queued.prompt_id);

        for _ in 0..MAX_POLLS {
            tokio::time::sleep(POLL_INTERVAL).await;
            let history = self.get_history(&queued.prompt_id).await?;
            let Some(entry) = history.prompts.get(&queued.prompt_id) else {
                continue;
            };
            if !entry.status.completed {
                continue;
            }
            let image = entry
                .outputs
                .values()
                .filter_map(|node| node.images.as_deref())
                .flatten()
                .next();
            return Ok(image.map(|img| self.view_url(img)));
        }

        tracing::warn!("ComfyUI prompt {} did not finish in time", queued.prompt_id);
        Ok(None)
    }

    /// Queue a workflow for execution.
    async fn queue_prompt(
        &self,
        workflow: serde_json::Value,
    ) -> Result<QueueResponse, ComfyUIError> {
        let request = QueuePromptRequest {
            prompt: workflow,
            client_id: Uuid::new_v4().to_string(),
        };

        let response = self
            .client
            .post(format!("{}/prompt", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(ComfyUIError::ApiError(error_text));
        }

        Ok(response.json().await?)
    }

    /// Get the history of a queued prompt.
    async fn get_history(&self, prompt_id: &str) -> Result<HistoryResponse, ComfyUIError> {
        let response = self
            .client
            .get(format!("{}/history/{}", self.base_url, prompt_id))
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(ComfyUIError::ApiError(error_text));
        }

        Ok(response.json().await?)
    }

    fn view_url(&self, image: &ImageOutput) -> String {
        format!(
            "{}/view?filename={}&subfolder={}&type={}",
            self.base_url, image.filename, image.subfolder, image.folder_type
        )
    }
}

/// Minimal txt2img workflow: checkpoint, positive/negative CLIP encode,
/// sampler, VAE decode, save.
fn character_workflow(prompt: &str) -> serde_json::Value {
    serde_json::json!({
        "1": {
            "class_type": "CheckpointLoaderSimple",
            "inputs": { "ckpt_name": "sd_xl_base_1.0.safetensors" }
        },
        "2": {
            "class_type": "CLIPTextEncode",
            "inputs": { "clip": ["1", 1], "text": prompt }
        },
        "3": {
            "class_type": "CLIPTextEncode",
            "inputs": {
                "clip": ["1", 1],
                "text": "blurry, text, watermark, photorealistic"
            }
        },
        "4": {
            "class_type": "EmptyLatentImage",
            "inputs": { "width": 512, "height": 512, "batch_size": 1 }
        },
        "5": {
            "class_type": "KSampler",
            "inputs": {
                "model": ["1", 0],
                "positive": ["2", 0],
                "negative": ["3", 0],
                "latent_image": ["4", 0],
                "seed": rand::random::<u32>(),
                "steps": 20,
                "cfg": 7.0,
                "sampler_name": "euler",
                "scheduler": "normal",
                "denoise": 1.0
            }
        },
        "6": {
            "class_type": "VAEDecode",
            "inputs": { "samples": ["5", 0], "vae": ["1", 2] }
        },
        "7": {
            "class_type": "SaveImage",
            "inputs": { "images": ["6", 0], "filename_prefix": "dragonfire" }
        }
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ComfyUIError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("API error: {0}")]
    ApiError(String),
}

#[derive(Debug, Serialize)]
struct QueuePromptRequest {
    prompt: serde_json::Value,
    client_id: String,
}

#[derive(Debug, Deserialize)]
struct QueueResponse {
    prompt_id: String,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(flatten)]
    prompts: std::collections::HashMap<String, PromptHistory>,
}

#[derive(Debug, Deserialize)]
struct PromptHistory {
    outputs: std::collections::HashMap<String, NodeOutput>,
    status: PromptStatus,
}

#[derive(Debug, Deserialize)]
struct NodeOutput {
    images: Option<Vec<ImageOutput>>,
}

#[derive(Debug, Deserialize)]
struct ImageOutput {
    filename: String,
    subfolder: String,
    #[serde(rename = "type")]
    folder_type: String,
}

#[derive(Debug, Deserialize)]
struct PromptStatus {
    completed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workflow_carries_the_prompt() {
        let workflow = character_workflow("Fantasy RPG sprite, Berserker, back view");
        assert_eq!(
            workflow["2"]["inputs"]["text"],
            "Fantasy RPG sprite, Berserker, back view"
        );
        assert_eq!(workflow["7"]["class_type"], "SaveImage");
    }

    #[test]
    fn history_deserializes_into_view_url_parts() {
        let json = r#"{
            "abc-123": {
                "outputs": {
                    "7": { "images": [
                        { "filename": "dragonfire_00001.png", "subfolder": "", "type": "output" }
                    ]}
                },
                "status": { "status_str": "success", "completed": true }
            }
        }"#;
        let history: HistoryResponse = serde_json::from_str(json).unwrap();
        let entry = &history.prompts["abc-123"];
        assert!(entry.status.completed);
        let image = entry.outputs["7"].images.as_ref().unwrap().first().unwrap();
        assert_eq!(image.filename, "dragonfire_00001.png");
        assert_eq!(image.folder_type, "output");
    }
}
