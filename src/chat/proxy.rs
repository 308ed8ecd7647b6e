//! Chat proxy
//!
//! Stateless forwarder of a single user message to a completion provider.

use crate::chat::client::CompletionProvider;
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

/// Chat proxy over a completion provider
#[derive(Clone)]
pub struct ChatProxy {
    provider: Arc<dyn CompletionProvider>,
}

impl ChatProxy {
    /// Create a proxy forwarding to `provider`
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    /// Relay one message and return the reply
    ///
    /// # Returns
    /// * `Ok(String)` - The provider's reply
    /// * `Err(AppError::Validation)` - Message missing or blank; the provider is not called
    /// * `Err(AppError::Upstream)` - The provider failed
    pub async fn relay(&self, message: Option<&str>) -> Result<String, AppError> {
        let message = message
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .ok_or_else(|| AppError::Validation("Message is required".to_string()))?;

        info!(message_len = message.len(), "Relaying chat message");
        let reply = self.provider.complete(message).await?;
        info!(reply_len = reply.len(), "Chat reply received");

        Ok(reply)
    }
}
