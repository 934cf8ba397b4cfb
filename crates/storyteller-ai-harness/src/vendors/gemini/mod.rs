//! Gemini Generative Language API integration.
//!
//! Wire types, response classification and the catalog fetch live here so the
//! root client API stays vendor-neutral.
mod catalog;
mod classify;
mod config;
mod wire;

pub use catalog::{CatalogClient, ModelHint, list_catalog, model_hint};
pub use config::GeminiClientConfig;

pub(crate) use catalog::hinted_ids;
pub(crate) use classify::{GenerationOutcome, classify_generation, remote_failure};
pub(crate) use wire::GenerateContentRequest;
