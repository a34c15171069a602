use std::time::{Duration, Instant};

use reqwest::Client;
use serde_json::{json, Value};
use thiserror::Error;

use crate::core::config::Settings;

#[derive(Debug, Error)]
pub(crate) enum AiError {
    #[error("GROQ_API_KEY is not configured")]
    MissingCredentials,
    #[error("Groq request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Groq API returned status {status}: {detail}")]
    Api { status: u16, detail: String },
    #[error("Groq response has no message content")]
    EmptyResponse,
    #[error("model output does not match the requested JSON contract: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OutputMode {
    Text,
    /// Ask the API for its schema-constrained JSON object mode.
    JsonObject,
}

/// Blocking round-trip chat completion against an OpenAI-compatible Groq endpoint.
/// One attempt per call: every failure in the pipeline is treated as non-retryable.
#[derive(Debug, Clone)]
pub(crate) struct ChatService {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl ChatService {
    pub(crate) fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        use anyhow::Context;

        let timeout = Duration::from_secs(settings.ai().ai_request_timeout);
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_key: settings.ai().groq_api_key.clone(),
            base_url: settings.ai().groq_base_url.trim_end_matches('/').to_string(),
            model: settings.ai().ai_model.clone(),
            max_tokens: settings.ai().ai_max_tokens,
        })
    }

    pub(crate) async fn complete(
        &self,
        purpose: &'static str,
        prompt: &str,
        temperature: f64,
        mode: OutputMode,
    ) -> Result<String, AiError> {
        if self.api_key.is_empty() {
            return Err(AiError::MissingCredentials);
        }

        let mut payload = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "max_completion_tokens": self.max_tokens,
            "temperature": temperature,
        });
        if mode == OutputMode::JsonObject {
            payload["response_format"] = json!({"type": "json_object"});
        }

        metrics::counter!("ai_requests_total", "kind" => purpose).increment(1);
        let timer = Instant::now();

        let url = format!("{}/chat/completions", self.base_url);
        let response =
            self.client.post(&url).bearer_auth(&self.api_key).json(&payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AiError::Api { status: status.as_u16(), detail });
        }

        let body: Value = response.json().await?;
        let content = body
            .get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|value| value.as_str())
            .ok_or(AiError::EmptyResponse)?;

        tracing::debug!(
            kind = purpose,
            duration_seconds = timer.elapsed().as_secs_f64(),
            "Chat completion finished"
        );

        Ok(content.trim().to_string())
    }
}
