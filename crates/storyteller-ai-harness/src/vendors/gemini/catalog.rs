use std::sync::Arc;

use tracing::{info, warn};

use crate::catalog::CatalogSource;
use crate::errors::ClientError;
use crate::model::{CatalogEntry, Credential};
use crate::transport::{HttpTransport, ReqwestTransport};

use super::classify::remote_failure;
use super::config::GeminiClientConfig;
use super::wire::{ListModelsResponse, RawModel};

const GENERATE_CONTENT: &str = "generateContent";

/// Identifier fragments of models that cannot narrate (vision-only,
/// embeddings, attributed QA).
const EXCLUDED_ID_FRAGMENTS: &[&str] = &["vision", "embedding", "aqa"];

/// Static description/tier fallback for models the backend under-describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelHint {
    pub description: &'static str,
    pub tier: &'static str,
}

const MODEL_HINTS: &[(&str, ModelHint)] = &[
    (
        "gemini-1.5-pro-latest",
        ModelHint {
            description: "Most capable 1.5 model; best for long, intricate stories.",
            tier: "Pro",
        },
    ),
    (
        "gemini-1.5-flash-latest",
        ModelHint {
            description: "Fast and versatile; good default for responsive play.",
            tier: "Flash",
        },
    ),
    (
        "gemini-1.5-flash-8b-latest",
        ModelHint {
            description: "Smallest 1.5 model; lowest latency.",
            tier: "Flash-8B",
        },
    ),
    (
        "gemini-2.0-flash",
        ModelHint {
            description: "Next-generation Flash model with stronger reasoning.",
            tier: "Flash",
        },
    ),
    (
        "gemini-1.0-pro",
        ModelHint {
            description: "First-generation Pro model.",
            tier: "Legacy",
        },
    ),
    (
        "gemini-pro",
        ModelHint {
            description: "First-generation Pro model (alias).",
            tier: "Legacy",
        },
    ),
];

/// Looks up the static hint for a model id.
pub fn model_hint(id: &str) -> Option<&'static ModelHint> {
    MODEL_HINTS
        .iter()
        .find(|(hint_id, _)| *hint_id == id)
        .map(|(_, hint)| hint)
}

/// Ids with a static hint, in table order.
pub(crate) fn hinted_ids() -> impl Iterator<Item = &'static str> {
    MODEL_HINTS.iter().map(|(id, _)| *id)
}

/// Fetches the selectable text-generation models for `credential`.
///
/// Fails with `MissingCredential` before any exchange when the credential is
/// blank or a placeholder. The result is filtered, enriched from the static
/// hint table and sorted by display name; an empty result is not an error.
pub async fn list_catalog(
    transport: &dyn HttpTransport,
    config: &GeminiClientConfig,
    credential: &Credential,
) -> Result<Vec<CatalogEntry>, ClientError> {
    if !credential.is_usable() {
        return Err(ClientError::MissingCredential);
    }

    let reply = transport.get(&config.models_url(), credential).await?;
    if !reply.is_success() {
        let err = remote_failure(&reply);
        warn!(event = "catalog.fetch_failed", status = reply.status, error = %err);
        return Err(err);
    }

    let listing: ListModelsResponse = serde_json::from_str(&reply.body)
        .map_err(|e| ClientError::MalformedResponse(format!("invalid model listing: {e}")))?;
    let listed = listing.models.len();
    let entries = catalog_from_listing(listing.models);
    info!(
        event = "catalog.fetched",
        listed = listed as u64,
        kept = entries.len() as u64
    );
    Ok(entries)
}

fn catalog_from_listing(models: Vec<RawModel>) -> Vec<CatalogEntry> {
    let mut entries: Vec<CatalogEntry> = models
        .into_iter()
        .filter(|m| m.supported_generation_methods.iter().any(|g| g == GENERATE_CONTENT))
        .filter_map(|m| {
            let id = m.name.strip_prefix("models/").unwrap_or(&m.name).to_string();
            let lowered = id.to_ascii_lowercase();
            if EXCLUDED_ID_FRAGMENTS.iter().any(|f| lowered.contains(f)) {
                return None;
            }
            let hint = model_hint(&id);
            let description = m
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty())
                .or_else(|| hint.map(|h| h.description.to_string()))
                .unwrap_or_default();
            let display_name = m
                .display_name
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| id.clone());
            Some(CatalogEntry {
                tier: hint.map(|h| h.tier.to_string()),
                id,
                display_name,
                description,
            })
        })
        .collect();
    entries.sort_by(|a, b| {
        a.display_name
            .cmp(&b.display_name)
            .then_with(|| a.id.cmp(&b.id))
    });
    entries
}

/// Catalog fetcher bound to one credential and transport.
pub struct CatalogClient {
    credential: Credential,
    transport: Arc<dyn HttpTransport>,
    config: GeminiClientConfig,
}

impl CatalogClient {
    pub fn new(
        credential: Credential,
        transport: Arc<dyn HttpTransport>,
        config: GeminiClientConfig,
    ) -> Self {
        Self {
            credential,
            transport,
            config,
        }
    }

    /// Creates a client with the default reqwest transport.
    pub fn with_default_transport(
        credential: Credential,
        config: GeminiClientConfig,
    ) -> Result<Self, ClientError> {
        let transport = Arc::new(ReqwestTransport::new(config.timeout)?);
        Ok(Self::new(credential, transport, config))
    }
}

#[async_trait::async_trait]
impl CatalogSource for CatalogClient {
    async fn list_catalog(&self) -> Result<Vec<CatalogEntry>, ClientError> {
        list_catalog(self.transport.as_ref(), &self.config, &self.credential).await
    }
}
