//! Data transfer objects for HTTP message serialization.

use serde::{Deserialize, Serialize};

/// Raw body of `POST /api/identify-food`; presence is checked by the handler.
#[derive(Debug, Deserialize)]
pub struct IdentifyFoodBody {
    #[serde(default)]
    pub image: Option<String>,
}

/// Raw body of `POST /api/generate-recipe`.
///
/// `messages` stays untyped until the handler has checked it is a non-empty
/// array, so shape errors get a precise message.
#[derive(Debug, Deserialize)]
pub struct GenerateRecipeBody {
    #[serde(default)]
    pub messages: Option<serde_json::Value>,
}

/// Response from the health check.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub timestamp: String,
}
