use dashmap::DashMap;

use super::RecordStore;
use crate::errors::StoreError;

/// In-process engine for ephemeral sessions; forgets everything on exit.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: DashMap<String, serde_json::Value>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryRecordStore {
    async fn read(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        Ok(self.records.get(key).map(|entry| entry.value().clone()))
    }

    async fn write(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError> {
        self.records.insert(key.to_string(), value);
        Ok(())
    }
}
