//! Completion API client
//!
//! Direct HTTP client for the external language model. One request per
//! call: no history, no streaming, no retry.

use crate::chat::types::{CompletionRequest, CompletionResponse};
use crate::config::ChatConfig;
use crate::error::AppError;
use async_trait::async_trait;
use std::time::Duration;

/// Something that turns a prompt into a reply
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Send a single-turn prompt and return the reply text
    async fn complete(&self, prompt: &str) -> Result<String, AppError>;
}

/// HTTP client for a `generateContent`-style completion API
pub struct CompletionClient {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl CompletionClient {
    /// Build a client with a shared connection pool and request timeout
    pub fn new(config: &ChatConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl CompletionProvider for CompletionClient {
    /// Call the completion API with a prompt
    ///
    /// # Errors
    /// * Returns `AppError::Upstream` if the API key is missing, the HTTP request
    ///   fails, the provider returns an error status or blocks the prompt, or the
    ///   response holds no text.
    async fn complete(&self, prompt: &str) -> Result<String, AppError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Upstream("API key is not configured".to_string()))?;

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, api_key
        );

        tracing::debug!(
            model = %self.model,
            prompt_len = prompt.len(),
            "Calling completion API"
        );

        let response = self
            .client
            .post(&url)
            .json(&CompletionRequest::single_turn(prompt))
            .send()
            .await
            .map_err(|e| {
                // reqwest errors can embed the URL, which carries the key
                AppError::Upstream(format!(
                    "Failed to send request to completion API: {}",
                    e.without_url()
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error body".to_string());

            tracing::error!(
                status_code = status.as_u16(),
                error_body = %error_body,
                "Completion API returned error status"
            );

            return Err(AppError::Upstream(format!(
                "Completion API returned error status {}",
                status.as_u16()
            )));
        }

        let parsed: CompletionResponse = response.json().await.map_err(|e| {
            AppError::Upstream(format!(
                "Failed to parse completion API response: {}",
                e.without_url()
            ))
        })?;

        if let Some(reason) = parsed
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_ref())
        {
            return Err(AppError::Upstream(format!(
                "Completion API blocked the prompt: {}",
                reason
            )));
        }

        let text = parsed
            .first_text()
            .ok_or_else(|| AppError::Upstream("Completion API returned no text".to_string()))?;

        tracing::debug!(
            response_len = text.len(),
            "Received reply from completion API"
        );

        Ok(text.to_string())
    }
}
