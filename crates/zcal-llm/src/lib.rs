//! Provider adapter between z-cal's message types and the model API.
//!
//! - [`ChatProvider`] — The seam agents talk to; one required operation
//! - [`OpenAiProvider`] — OpenAI-compatible implementation
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use zcal_llm::{ChatProvider, OpenAiProvider};
//!
//! let provider = OpenAiProvider::new(&api_key, "gpt-4o", None)?;
//! let reply = provider.chat_text("Is oatmeal healthy?", Some("You are a nutritionist.")).await?;
//! ```
//!
//! # Vision
//!
//! ```rust,ignore
//! let reply = provider
//!     .chat_with_vision(&image_base64, "What food is this?", Some(system_prompt))
//!     .await?;
//! ```

mod client;
mod provider;

pub use client::{
    content_to_text, normalize_messages, reshape_response, NormalizedMessages, OpenAiProvider, RawCompletion,
    DEFAULT_MAX_TOKENS,
};
pub use provider::{ChatProvider, DEFAULT_MODEL, VISION_MEDIA_TYPE};
pub use zcal_core::{ProviderRequest, ProviderResponse};
