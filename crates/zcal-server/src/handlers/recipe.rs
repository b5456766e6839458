use std::sync::Arc;

use axum::{body::Bytes, extract::State, Json};
use serde_json::Value;
use tracing::error;
use zcal_agents::scrape_recipe_facts;
use zcal_core::{ChatMessage, RecipeChatResponse};

use super::parse_json;
use crate::dto::GenerateRecipeBody;
use crate::error::AppError;
use crate::ServerState;

const MESSAGES_REQUIRED: &str =
    "Messages field is required and must be a non-empty array of chat messages";

/// POST /api/generate-recipe
pub async fn generate_recipe(
    State(state): State<Arc<ServerState>>,
    body: Bytes,
) -> Result<Json<RecipeChatResponse>, AppError> {
    let payload: GenerateRecipeBody = parse_json(&body)?;

    let items = match payload.messages {
        Some(Value::Array(items)) if !items.is_empty() => items,
        _ => return Err(AppError::BadRequest(MESSAGES_REQUIRED.into())),
    };

    let messages: Vec<ChatMessage> = serde_json::from_value(Value::Array(items))
        .map_err(|e| AppError::BadRequest(format!("Invalid chat message: {e}")))?;

    let response = state
        .recipe_agent
        .generate_chat_response(&messages)
        .await
        .map_err(|e| {
            error!("Error in generate_recipe: {}", e);
            AppError::from(e)
        })?;

    let facts = scrape_recipe_facts(&response);
    Ok(Json(RecipeChatResponse {
        response,
        estimated_calories: facts.estimated_calories,
        preparation_time: facts.preparation_time,
    }))
}
