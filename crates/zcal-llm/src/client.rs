//! OpenAI-compatible chat client.
//!
//! Works with the OpenAI API and any compatible endpoint (set `api_base`).
//! Internal [`ProviderRequest`]s are translated to the SDK's request types and
//! the reply is reshaped into a [`ProviderResponse`].

use std::time::Instant;

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestMessageContentPartImage, ChatCompletionRequestMessageContentPartText,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        ChatCompletionRequestUserMessageContent, ChatCompletionRequestUserMessageContentPart,
        CreateChatCompletionRequestArgs, CreateChatCompletionResponse, ImageUrl,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, info};
use zcal_core::{
    AgentError, ChatRole, ContentBlock, MessageContent, ProviderChoice, ProviderMessage, ProviderReply,
    ProviderRequest, ProviderResponse, Usage,
};

use crate::provider::ChatProvider;

/// Used when a request does not set `max_tokens`.
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Converts any error into an AgentError::LlmError.
fn llm_err(e: impl ToString) -> AgentError {
    AgentError::LlmError(e.to_string())
}

/// Messages split into the folded system prompt and the ordered conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedMessages {
    pub system: String,
    pub messages: Vec<(ChatRole, Vec<ContentBlock>)>,
}

/// Pulls system messages out of the conversation and turns every remaining
/// message into content blocks.
///
/// When several system messages are present the last one wins.
pub fn normalize_messages(messages: &[ProviderMessage]) -> NormalizedMessages {
    let mut system = String::new();
    let mut rest = Vec::with_capacity(messages.len());

    for msg in messages {
        match msg.role {
            ChatRole::System => system = msg.content.to_text(),
            role => rest.push((role, msg.content.clone().into_blocks())),
        }
    }

    NormalizedMessages { system, messages: rest }
}

/// Flattens message content to plain text; image blocks are dropped.
pub fn content_to_text(content: &MessageContent) -> String {
    content.to_text()
}

/// Builds a `data:` URL the chat-completions API accepts for inline images.
fn data_url(media_type: &str, data: &str) -> String {
    format!("data:{media_type};base64,{data}")
}

fn user_parts(blocks: Vec<ContentBlock>) -> Vec<ChatCompletionRequestUserMessageContentPart> {
    blocks
        .into_iter()
        .map(|block| match block {
            ContentBlock::Text { text } => ChatCompletionRequestUserMessageContentPart::Text(
                ChatCompletionRequestMessageContentPartText { text },
            ),
            ContentBlock::Image { source } => ChatCompletionRequestUserMessageContentPart::ImageUrl(
                ChatCompletionRequestMessageContentPartImage {
                    image_url: ImageUrl {
                        url: data_url(&source.media_type, &source.data),
                        detail: None,
                    },
                },
            ),
        })
        .collect()
}

/// Translates normalized messages into SDK request messages.
fn build_messages(normalized: NormalizedMessages) -> Result<Vec<ChatCompletionRequestMessage>, AgentError> {
    let mut out = Vec::with_capacity(normalized.messages.len() + 1);

    if !normalized.system.is_empty() {
        out.push(ChatCompletionRequestMessage::System(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(normalized.system)
                .build()
                .map_err(llm_err)?,
        ));
    }

    for (role, blocks) in normalized.messages {
        let msg = match role {
            ChatRole::Assistant => {
                let text = content_to_text(&MessageContent::Blocks(blocks));
                ChatCompletionRequestMessage::Assistant(
                    ChatCompletionRequestAssistantMessageArgs::default()
                        .content(text)
                        .build()
                        .map_err(llm_err)?,
                )
            }
            _ => ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(ChatCompletionRequestUserMessageContent::Array(user_parts(blocks)))
                    .build()
                    .map_err(llm_err)?,
            ),
        };
        out.push(msg);
    }

    Ok(out)
}

/// The parts of a provider reply that may be missing.
#[derive(Debug, Clone, Default)]
pub struct RawCompletion {
    pub id: Option<String>,
    pub created: Option<i64>,
    pub content: Option<String>,
    pub finish_reason: Option<String>,
    pub usage: Option<Usage>,
}

impl From<CreateChatCompletionResponse> for RawCompletion {
    fn from(response: CreateChatCompletionResponse) -> Self {
        let usage = response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });
        let choice = response.choices.into_iter().next();
        let finish_reason = choice
            .as_ref()
            .and_then(|c| c.finish_reason.as_ref())
            .and_then(|r| serde_json::to_value(r).ok())
            .and_then(|v| v.as_str().map(String::from));

        Self {
            id: Some(response.id),
            created: Some(i64::from(response.created)),
            content: choice.map(|c| c.message.content.unwrap_or_default()),
            finish_reason,
            usage,
        }
    }
}

/// Reshapes a provider reply into a [`ProviderResponse`], filling synthetic
/// defaults for anything the provider left out.
pub fn reshape_response(raw: RawCompletion, model: &str) -> Result<ProviderResponse, AgentError> {
    let content = raw.content.ok_or(AgentError::UnexpectedResponse)?;

    Ok(ProviderResponse {
        id: raw
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| format!("chatcmpl-{}", uuid::Uuid::new_v4())),
        object: "chat.completion".to_string(),
        created: raw.created.unwrap_or_else(|| chrono::Utc::now().timestamp()),
        model: model.to_string(),
        choices: vec![ProviderChoice {
            index: 0,
            message: ProviderReply { role: "assistant".to_string(), content },
            finish_reason: raw.finish_reason.unwrap_or_else(|| "stop".to_string()),
        }],
        usage: raw.usage.unwrap_or_default(),
    })
}

/// Client for OpenAI-compatible chat completion APIs.
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    default_model: String,
}

impl OpenAiProvider {
    /// Creates a new client for the given key, model and optional API base URL.
    pub fn new(api_key: &str, model: &str, api_base: Option<&str>) -> Result<Self, AgentError> {
        if api_key.is_empty() {
            return Err(AgentError::InvalidInput("OpenAI API key is required".into()));
        }

        let config = match api_base {
            Some(base) => OpenAIConfig::new().with_api_key(api_key).with_api_base(base),
            None => OpenAIConfig::new().with_api_key(api_key),
        };

        Ok(Self {
            client: Client::with_config(config),
            default_model: model.to_string(),
        })
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    fn model(&self) -> &str {
        &self.default_model
    }

    #[allow(deprecated)]
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, AgentError> {
        let start = Instant::now();
        let model = if request.model.is_empty() { self.default_model.clone() } else { request.model };
        let messages = build_messages(normalize_messages(&request.messages))?;

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(&model)
            .messages(messages)
            .max_tokens(request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS));
        if let Some(temperature) = request.temperature {
            builder.temperature(temperature);
        }
        let sdk_request = builder.build().map_err(llm_err)?;

        let response = self.client.chat().create(sdk_request).await.map_err(llm_err)?;
        let reshaped = reshape_response(RawCompletion::from(response), &model)?;

        info!(
            "LLM: {}ms, tokens: {}/{} (in/out)",
            start.elapsed().as_millis(),
            reshaped.usage.prompt_tokens,
            reshaped.usage.completion_tokens
        );
        debug!("LLM reply: {}", reshaped.first_content().unwrap_or_default());

        Ok(reshaped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_system_message_wins_and_order_is_kept() {
        let messages = vec![
            ProviderMessage::new(ChatRole::System, "first"),
            ProviderMessage::new(ChatRole::User, "hi"),
            ProviderMessage::new(ChatRole::System, "second"),
            ProviderMessage::new(ChatRole::Assistant, "hello"),
        ];

        let normalized = normalize_messages(&messages);

        assert_eq!(normalized.system, "second");
        assert_eq!(
            normalized.messages,
            vec![
                (ChatRole::User, vec![ContentBlock::text("hi")]),
                (ChatRole::Assistant, vec![ContentBlock::text("hello")]),
            ]
        );
    }

    #[test]
    fn blocks_are_passed_through_untouched() {
        let blocks = vec![ContentBlock::text("what"), ContentBlock::base64_image("image/png", "QUJD")];
        let messages = vec![ProviderMessage::new(ChatRole::User, MessageContent::Blocks(blocks.clone()))];

        let normalized = normalize_messages(&messages);

        assert!(normalized.system.is_empty());
        assert_eq!(normalized.messages, vec![(ChatRole::User, blocks)]);
    }

    #[test]
    fn sdk_messages_include_system_and_image_parts() {
        let normalized = NormalizedMessages {
            system: "be brief".into(),
            messages: vec![
                (ChatRole::User, vec![ContentBlock::text("what"), ContentBlock::base64_image("image/jpeg", "QUJD")]),
                (ChatRole::Assistant, vec![ContentBlock::text("an apple")]),
            ],
        };

        let out = build_messages(normalized).unwrap();
        assert_eq!(out.len(), 3);
        assert!(matches!(out[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(out[2], ChatCompletionRequestMessage::Assistant(_)));

        match &out[1] {
            ChatCompletionRequestMessage::User(user) => match &user.content {
                ChatCompletionRequestUserMessageContent::Array(parts) => {
                    assert_eq!(parts.len(), 2);
                    match &parts[1] {
                        ChatCompletionRequestUserMessageContentPart::ImageUrl(img) => {
                            assert_eq!(img.image_url.url, "data:image/jpeg;base64,QUJD");
                        }
                        _ => panic!("expected image part"),
                    }
                }
                _ => panic!("expected content parts"),
            },
            _ => panic!("expected user message"),
        }
    }

    #[test]
    fn content_text_skips_images() {
        let content = MessageContent::Blocks(vec![
            ContentBlock::text("line one"),
            ContentBlock::base64_image("image/jpeg", "QUJD"),
            ContentBlock::text("line two"),
        ]);
        assert_eq!(content_to_text(&content), "line one\nline two");
        assert_eq!(content_to_text(&MessageContent::from("plain")), "plain");
    }

    #[test]
    fn empty_system_prompt_is_not_sent() {
        let normalized = NormalizedMessages {
            system: String::new(),
            messages: vec![(ChatRole::User, vec![ContentBlock::text("hi")])],
        };
        let out = build_messages(normalized).unwrap();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn reshape_fills_synthetic_defaults() {
        let raw = RawCompletion { content: Some("hello".into()), ..Default::default() };

        let resp = reshape_response(raw, "gpt-4o").unwrap();

        assert!(resp.id.starts_with("chatcmpl-"));
        assert_eq!(resp.object, "chat.completion");
        assert_eq!(resp.model, "gpt-4o");
        assert_eq!(resp.choices.len(), 1);
        assert_eq!(resp.choices[0].finish_reason, "stop");
        assert_eq!(resp.choices[0].message.role, "assistant");
        assert_eq!(resp.first_content(), Some("hello"));
        assert_eq!(resp.usage, Usage::default());
        assert!(resp.created > 0);
    }

    #[test]
    fn reshape_keeps_provider_values() {
        let raw = RawCompletion {
            id: Some("chatcmpl-abc".into()),
            created: Some(1_700_000_000),
            content: Some("done".into()),
            finish_reason: Some("length".into()),
            usage: Some(Usage { prompt_tokens: 10, completion_tokens: 5, total_tokens: 15 }),
        };

        let resp = reshape_response(raw, "gpt-4o").unwrap();

        assert_eq!(resp.id, "chatcmpl-abc");
        assert_eq!(resp.created, 1_700_000_000);
        assert_eq!(resp.choices[0].finish_reason, "length");
        assert_eq!(resp.usage.total_tokens, 15);
    }

    #[test]
    fn empty_id_is_replaced() {
        let raw = RawCompletion { id: Some(String::new()), content: Some("x".into()), ..Default::default() };
        assert!(reshape_response(raw, "m").unwrap().id.starts_with("chatcmpl-"));
    }

    #[test]
    fn reply_without_choices_is_unexpected() {
        let err = reshape_response(RawCompletion::default(), "gpt-4o").unwrap_err();
        assert!(matches!(err, AgentError::UnexpectedResponse));
    }

    #[test]
    fn blank_api_key_is_rejected() {
        assert!(OpenAiProvider::new("", "gpt-4o", None).is_err());
        let provider = OpenAiProvider::new("sk-test", "gpt-4o-mini", None).unwrap();
        assert_eq!(provider.model(), "gpt-4o-mini");
    }
}
