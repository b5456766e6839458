//! Provider abstraction shared by every agent.

use async_trait::async_trait;
use zcal_core::{AgentError, ChatRole, ContentBlock, ProviderMessage, ProviderRequest, ProviderResponse};

pub use zcal_core::DEFAULT_MODEL;

/// Media type attached to vision requests.
pub const VISION_MEDIA_TYPE: &str = "image/jpeg";

const VISION_MAX_TOKENS: u32 = 500;
const TEXT_MAX_TOKENS: u32 = 1000;

/// A chat-completion backend.
///
/// Implementors only provide [`complete`](ChatProvider::complete); the other
/// operations are built on top of it and issue exactly one call each.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Sends one chat-completion request.
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, AgentError>;

    /// Model name used by [`chat_with_vision`](ChatProvider::chat_with_vision)
    /// and [`chat_text`](ChatProvider::chat_text).
    fn model(&self) -> &str {
        DEFAULT_MODEL
    }

    /// Alias of [`complete`](ChatProvider::complete) for callers that build
    /// their own message list.
    async fn chat(&self, request: ProviderRequest) -> Result<ProviderResponse, AgentError> {
        self.complete(request).await
    }

    /// Asks about a base64 image and returns the reply text.
    async fn chat_with_vision(
        &self,
        image_base64: &str,
        prompt: &str,
        system_prompt: Option<&str>,
    ) -> Result<String, AgentError> {
        let mut messages = system_message(system_prompt);
        messages.push(ProviderMessage::new(
            ChatRole::User,
            zcal_core::MessageContent::Blocks(vec![
                ContentBlock::text(prompt),
                ContentBlock::base64_image(VISION_MEDIA_TYPE, image_base64),
            ]),
        ));

        let request = ProviderRequest {
            model: self.model().to_string(),
            messages,
            max_tokens: Some(VISION_MAX_TOKENS),
            temperature: None,
        };

        let response = self.complete(request).await?;
        Ok(response.first_content().unwrap_or_default().to_string())
    }

    /// Sends a single text question and returns the reply text.
    async fn chat_text(
        &self,
        user_message: &str,
        system_prompt: Option<&str>,
    ) -> Result<String, AgentError> {
        let mut messages = system_message(system_prompt);
        messages.push(ProviderMessage::new(
            ChatRole::User,
            zcal_core::MessageContent::Blocks(vec![ContentBlock::text(user_message)]),
        ));

        let request = ProviderRequest {
            model: self.model().to_string(),
            messages,
            max_tokens: Some(TEXT_MAX_TOKENS),
            temperature: None,
        };

        let response = self.complete(request).await?;
        Ok(response.first_content().unwrap_or_default().to_string())
    }
}

fn system_message(system_prompt: Option<&str>) -> Vec<ProviderMessage> {
    system_prompt
        .filter(|s| !s.is_empty())
        .map(|s| vec![ProviderMessage::new(ChatRole::System, s)])
        .unwrap_or_default()
}
