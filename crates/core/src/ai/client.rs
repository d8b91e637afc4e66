use serde_json::Value;

use super::{ModelError, TextModel};
use crate::{config::ModelConfig, error::Result, provider::Provider};

const SYSTEM_PROMPT: &str =
    "You are a careful assistant that analyzes YouTube video transcripts. Follow the requested output format exactly.";

/// OpenAI-compatible chat completions endpoint
#[derive(Debug, Clone)]
pub struct ChatCompletionsModel {
    http: reqwest::Client,
    provider: Provider,
    api_url: String,
    model: String,
    api_key: String,
    temperature: f32,
}

impl ChatCompletionsModel {
    pub fn new(provider: Provider, api_key: impl Into<String>) -> Self {
        let config = provider.config();
        Self {
            http: reqwest::Client::new(),
            provider,
            api_url: config.api_url.to_string(),
            model: config.model.to_string(),
            api_key: api_key.into(),
            temperature: 0.3,
        }
    }

    /// Build from config; fails when no API key can be found
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        let api_key = config.provider.resolve_api_key(config.api_key.as_deref())?;
        let mut model = Self::new(config.provider, api_key);
        if let Some(name) = config.model.as_deref().filter(|m| !m.trim().is_empty()) {
            model = model.with_model(name);
        }
        Ok(model)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }
}

impl TextModel for ChatCompletionsModel {
    async fn generate(&self, prompt: &str) -> Result<String> {
        tracing::debug!(
            provider = self.provider.name(),
            model = %self.model,
            prompt_chars = prompt.len(),
            "model request"
        );

        let response = self
            .http
            .post(&self.api_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&serde_json::json!({
                "model": self.model,
                "messages": [
                    {
                        "role": "system",
                        "content": SYSTEM_PROMPT,
                    },
                    {
                        "role": "user",
                        "content": prompt,
                    },
                ],
                "temperature": self.temperature,
            }))
            .send()
            .await
            .map_err(|e| ModelError::classify(e.status().map(|s| s.as_u16()), &e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::classify(Some(status.as_u16()), &body).into());
        }

        let response: Value = response.json().await?;
        extract_content(&response)
    }
}

fn extract_content(response: &Value) -> Result<String> {
    let content = response["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| ModelError::Other(format!("Invalid API response: {}", response)))?;
    Ok(content.to_string())
}
