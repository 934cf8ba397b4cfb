use crate::errors::ClientError;
use crate::model::CatalogEntry;
use crate::vendors::gemini::model_hint;

/// Source of truth for the selectable model list.
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync {
    async fn list_catalog(&self) -> Result<Vec<CatalogEntry>, ClientError>;
}

/// Offline catalog built from the static hint table, for stub mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubCatalog;

#[async_trait::async_trait]
impl CatalogSource for StubCatalog {
    async fn list_catalog(&self) -> Result<Vec<CatalogEntry>, ClientError> {
        let mut entries: Vec<CatalogEntry> = crate::vendors::gemini::hinted_ids()
            .filter_map(|id| {
                model_hint(id).map(|hint| CatalogEntry {
                    id: id.to_string(),
                    display_name: id.to_string(),
                    description: hint.description.to_string(),
                    tier: Some(hint.tier.to_string()),
                })
            })
            .collect();
        entries.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        Ok(entries)
    }
}
