//! Core domain types and error definitions for z-cal.
//!
//! This crate provides the types shared across the z-cal workspace:
//!
//! - [`AgentError`] — Error type for agent and provider operations
//! - [`ChatMessage`] and [`ChatRole`] — Client-facing conversation messages
//! - [`ProviderRequest`] and [`ProviderResponse`] — Chat-completion wire shapes
//!   exchanged with the model provider adapter
//! - [`FoodIdentificationRequest`], [`FoodIdentificationResponse`] — Food
//!   recognition payloads
//! - [`RecipeChatRequest`], [`RecipeChatResponse`] — Recipe chat payloads
//!
//! # Example
//!
//! ```rust
//! use zcal_core::{ChatMessage, ChatRole, FoodMacros};
//!
//! let msg = ChatMessage::user("I have rice and beans");
//! assert_eq!(msg.role, ChatRole::User);
//!
//! let macros = FoodMacros::grams(25, 40, 10);
//! assert_eq!(macros.protein, "25g");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Largest accepted decoded image, in mebibytes, when none is configured.
pub const DEFAULT_MAX_IMAGE_MB: u32 = 5;

/// Errors that can occur while identifying food or talking to the provider.
#[derive(Error, Debug)]
pub enum AgentError {
    /// The caller supplied input that can never succeed (bad image, oversize, ...).
    #[error("{0}")]
    InvalidInput(String),

    /// LLM API request failed.
    #[error("LLM request failed: {0}")]
    LlmError(String),

    /// The provider answered with something that is not a chat message.
    #[error("Unexpected response from chat provider")]
    UnexpectedResponse,

    /// Failed to parse structured output from LLM.
    #[error("Failed to parse structured output: {0}")]
    ParseError(String),

    /// Food recognition could not be completed.
    #[error("Failed to identify food from image")]
    IdentificationFailed,
}

impl AgentError {
    /// Returns true when the error was caused by the request itself.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, AgentError::InvalidInput(_))
    }
}

impl From<serde_json::Error> for AgentError {
    fn from(err: serde_json::Error) -> Self {
        AgentError::ParseError(err.to_string())
    }
}

// ============================================================================
// Conversation Types
// ============================================================================

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Instructions that frame the conversation.
    System,
    /// Message from the user.
    User,
    /// Message from the assistant/LLM.
    Assistant,
}

/// A single message in a client conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The role of the message sender.
    pub role: ChatRole,
    /// The content of the message.
    pub content: String,
}

impl ChatMessage {
    /// Creates a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into() }
    }

    /// Creates a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }

    /// Creates a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into() }
    }
}

// ============================================================================
// Provider Wire Types
// ============================================================================

/// Base64 image payload attached to a provider message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSource {
    /// Encoding of `data`; always `"base64"` today.
    #[serde(rename = "type")]
    pub source_type: String,
    /// MIME type of the decoded image (e.g. `image/jpeg`).
    pub media_type: String,
    /// Base64 data without any `data:` prefix.
    pub data: String,
}

/// A typed block inside a provider message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text { text: String },
    Image { source: ImageSource },
}

impl ContentBlock {
    /// Creates a text block.
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    /// Creates a base64 image block.
    pub fn base64_image(media_type: impl Into<String>, data: impl Into<String>) -> Self {
        ContentBlock::Image {
            source: ImageSource {
                source_type: "base64".to_string(),
                media_type: media_type.into(),
                data: data.into(),
            },
        }
    }
}

/// Message content: either plain text or a list of blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl MessageContent {
    /// Normalizes the content into blocks; plain text becomes one text block.
    pub fn into_blocks(self) -> Vec<ContentBlock> {
        match self {
            MessageContent::Text(text) => vec![ContentBlock::Text { text }],
            MessageContent::Blocks(blocks) => blocks,
        }
    }

    /// Joins every text block with newlines, ignoring images.
    pub fn to_text(&self) -> String {
        match self {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .filter_map(|b| match b {
                    ContentBlock::Text { text } => Some(text.as_str()),
                    ContentBlock::Image { .. } => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

impl From<String> for MessageContent {
    fn from(text: String) -> Self {
        MessageContent::Text(text)
    }
}

impl From<&str> for MessageContent {
    fn from(text: &str) -> Self {
        MessageContent::Text(text.to_string())
    }
}

/// A message sent to the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderMessage {
    pub role: ChatRole,
    pub content: MessageContent,
}

impl ProviderMessage {
    pub fn new(role: ChatRole, content: impl Into<MessageContent>) -> Self {
        Self { role, content: content.into() }
    }
}

impl From<ChatMessage> for ProviderMessage {
    fn from(msg: ChatMessage) -> Self {
        Self { role: msg.role, content: MessageContent::Text(msg.content) }
    }
}

/// Chat-completion request handed to the provider adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRequest {
    pub model: String,
    pub messages: Vec<ProviderMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// The assistant message inside a [`ProviderChoice`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderReply {
    pub role: String,
    pub content: String,
}

/// One completion candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderChoice {
    pub index: u32,
    pub message: ProviderReply,
    pub finish_reason: String,
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Chat-completion response returned by the provider adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ProviderChoice>,
    pub usage: Usage,
}

impl ProviderResponse {
    /// Content of the first choice, if any.
    pub fn first_content(&self) -> Option<&str> {
        self.choices.first().map(|c| c.message.content.as_str())
    }
}

// ============================================================================
// Food Identification
// ============================================================================

/// Request to identify the food shown in an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodIdentificationRequest {
    /// Bare base64 or a `data:image/...;base64,` URL.
    pub image: String,
}

/// Macro breakdown; each value carries its unit (e.g. `"25g"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodMacros {
    pub protein: String,
    pub carbs: String,
    pub fat: String,
}

impl FoodMacros {
    /// Builds macros from gram amounts.
    pub fn grams(protein: u32, carbs: u32, fat: u32) -> Self {
        Self {
            protein: format!("{protein}g"),
            carbs: format!("{carbs}g"),
            fat: format!("{fat}g"),
        }
    }
}

/// Nutrition report for an identified food.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodIdentificationResponse {
    pub name: String,
    pub calories: u32,
    pub macros: FoodMacros,
    /// 0 (unhealthy) to 100 (optimal).
    pub health_score: u8,
    pub insights: String,
}

// ============================================================================
// Recipe Chat
// ============================================================================

/// Ordered conversation sent by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeChatRequest {
    pub messages: Vec<ChatMessage>,
}

/// Assistant reply, with facts scraped from it when present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeChatResponse {
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_calories: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preparation_time: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn food_response_uses_camel_case() {
        let resp = FoodIdentificationResponse {
            name: "Apple".into(),
            calories: 95,
            macros: FoodMacros::grams(0, 25, 0),
            health_score: 90,
            insights: "Great snack".into(),
        };

        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "Apple",
                "calories": 95,
                "macros": { "protein": "0g", "carbs": "25g", "fat": "0g" },
                "healthScore": 90,
                "insights": "Great snack"
            })
        );
    }

    #[test]
    fn recipe_response_omits_missing_facts() {
        let resp = RecipeChatResponse {
            response: "Here is your recipe".into(),
            estimated_calories: None,
            preparation_time: None,
        };
        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            json!({ "response": "Here is your recipe" })
        );
    }

    #[test]
    fn message_content_accepts_string_or_blocks() {
        let text: MessageContent = serde_json::from_value(json!("hi")).unwrap();
        assert_eq!(text, MessageContent::Text("hi".into()));

        let blocks: MessageContent = serde_json::from_value(json!([
            { "type": "text", "text": "look" },
            { "type": "image", "source": { "type": "base64", "media_type": "image/png", "data": "QUJD" } }
        ]))
        .unwrap();
        assert_eq!(
            blocks,
            MessageContent::Blocks(vec![
                ContentBlock::text("look"),
                ContentBlock::base64_image("image/png", "QUJD"),
            ])
        );
        assert_eq!(blocks.to_text(), "look");
    }

    #[test]
    fn plain_text_normalizes_to_single_block() {
        let blocks = MessageContent::from("hello").into_blocks();
        assert_eq!(blocks, vec![ContentBlock::text("hello")]);
    }

    #[test]
    fn only_invalid_input_is_a_client_error() {
        assert!(AgentError::InvalidInput("Invalid base64 image format".into()).is_invalid_input());
        assert!(!AgentError::IdentificationFailed.is_invalid_input());
        assert!(!AgentError::LlmError("boom".into()).is_invalid_input());
    }

    #[test]
    fn chat_role_parses_lowercase() {
        let msg: ChatMessage =
            serde_json::from_value(json!({ "role": "assistant", "content": "hi" })).unwrap();
        assert_eq!(msg, ChatMessage::assistant("hi"));
    }
}
