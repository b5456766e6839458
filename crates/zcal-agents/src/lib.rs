//! Agents that prompt the model and interpret its replies.
//!
//! - [`FoodIdentifierAgent`] — Validates a base64 photo, asks the vision model
//!   for a nutrition report and normalizes whatever comes back
//! - [`RecipeGeneratorAgent`] — Runs a recipe conversation behind a fixed chef
//!   prompt
//!
//! Handlers depend on the [`FoodIdentifier`] and [`RecipeAssistant`] traits so
//! either agent can be swapped for a fake in tests.

pub mod food;
pub mod image;
pub mod parse;
pub mod prompts;
pub mod recipe;

pub use food::{FoodIdentifier, FoodIdentifierAgent, DEFAULT_MAX_IMAGE_MB};
pub use recipe::{scrape_recipe_facts, RecipeAssistant, RecipeFacts, RecipeGeneratorAgent};
