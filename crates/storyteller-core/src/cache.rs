use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storyteller_ai_harness::CatalogEntry;
use tracing::debug;

use crate::errors::StoreError;
use crate::store::RecordStore;

/// Fixed name of the single catalog record.
pub const CATALOG_RECORD_KEY: &str = "storyteller.model-catalog";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogRecord {
    fetched_at: DateTime<Utc>,
    entries: Vec<CatalogEntry>,
}

/// Cache of the last successfully fetched model catalog.
///
/// Owns exactly one record in the underlying store; `put` replaces it
/// wholesale and `get` never writes.
#[derive(Clone)]
pub struct CatalogCache {
    store: Arc<dyn RecordStore>,
}

impl CatalogCache {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Returns the cached catalog, or `None` when absent or empty.
    pub async fn get(&self) -> Result<Option<Vec<CatalogEntry>>, StoreError> {
        let Some(value) = self.store.read(CATALOG_RECORD_KEY).await? else {
            return Ok(None);
        };
        let record: CatalogRecord = serde_json::from_value(value).map_err(|e| {
            StoreError::OperationFailed(format!("cached catalog is unreadable: {e}"))
        })?;
        debug!(
            event = "cache.read",
            entries = record.entries.len() as u64,
            fetched_at = %record.fetched_at
        );
        Ok(Some(record.entries).filter(|entries| !entries.is_empty()))
    }

    /// Replaces the cached catalog with `entries`.
    pub async fn put(&self, entries: &[CatalogEntry]) -> Result<(), StoreError> {
        let record = CatalogRecord {
            fetched_at: Utc::now(),
            entries: entries.to_vec(),
        };
        let value = serde_json::to_value(&record)
            .map_err(|e| StoreError::OperationFailed(format!("encode catalog: {e}")))?;
        self.store.write(CATALOG_RECORD_KEY, value).await?;
        debug!(event = "cache.written", entries = entries.len() as u64);
        Ok(())
    }
}
