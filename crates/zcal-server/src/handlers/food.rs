use std::sync::Arc;

use axum::{body::Bytes, extract::State, Json};
use tracing::{error, info};
use zcal_core::{FoodIdentificationRequest, FoodIdentificationResponse};

use super::parse_json;
use crate::dto::IdentifyFoodBody;
use crate::error::AppError;
use crate::ServerState;

/// POST /api/identify-food
pub async fn identify_food(
    State(state): State<Arc<ServerState>>,
    body: Bytes,
) -> Result<Json<FoodIdentificationResponse>, AppError> {
    let payload: IdentifyFoodBody = parse_json(&body)?;

    let image = payload
        .image
        .filter(|image| !image.is_empty())
        .ok_or_else(|| AppError::BadRequest("Image field is required".into()))?;

    let result = state
        .food_agent
        .identify_food(&FoodIdentificationRequest { image })
        .await
        .map_err(|e| {
            error!("Error in identify_food: {}", e);
            AppError::from(e)
        })?;

    info!("Identified food: {} ({} kcal)", result.name, result.calories);
    Ok(Json(result))
}
