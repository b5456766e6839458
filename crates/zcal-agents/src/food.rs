use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};
use zcal_core::{AgentError, FoodIdentificationRequest, FoodIdentificationResponse};
use zcal_llm::ChatProvider;

use crate::image::{clean_base64, validate_base64_image, validate_image_size};
use crate::parse::parse_food_reply;
use crate::prompts::{FOOD_SYSTEM_PROMPT, FOOD_USER_PROMPT};

pub use zcal_core::DEFAULT_MAX_IMAGE_MB;

/// Identifies the food in an image and reports its nutrition.
#[async_trait]
pub trait FoodIdentifier: Send + Sync {
    async fn identify_food(
        &self,
        request: &FoodIdentificationRequest,
    ) -> Result<FoodIdentificationResponse, AgentError>;
}

pub struct FoodIdentifierAgent {
    provider: Arc<dyn ChatProvider>,
    max_image_mb: u32,
}

impl FoodIdentifierAgent {
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self {
            provider,
            max_image_mb: DEFAULT_MAX_IMAGE_MB,
        }
    }

    pub fn with_max_image_mb(mut self, max_image_mb: u32) -> Self {
        self.max_image_mb = max_image_mb;
        self
    }
}

#[async_trait]
impl FoodIdentifier for FoodIdentifierAgent {
    async fn identify_food(
        &self,
        request: &FoodIdentificationRequest,
    ) -> Result<FoodIdentificationResponse, AgentError> {
        if !validate_base64_image(&request.image) {
            return Err(AgentError::InvalidInput("Invalid base64 image format".into()));
        }

        if !validate_image_size(&request.image, self.max_image_mb) {
            return Err(AgentError::InvalidInput(format!(
                "Image size exceeds {}MB limit",
                self.max_image_mb
            )));
        }

        info!("FOOD: Identifying food ({} base64 chars)", request.image.len());

        let reply = self
            .provider
            .chat_with_vision(clean_base64(&request.image), FOOD_USER_PROMPT, Some(FOOD_SYSTEM_PROMPT))
            .await
            .map_err(|e| {
                error!("Error identifying food: {}", e);
                AgentError::IdentificationFailed
            })?;

        let result = parse_food_reply(&reply);
        info!("FOOD: Identified '{}' ({} kcal)", result.name, result.calories);
        Ok(result)
    }
}
