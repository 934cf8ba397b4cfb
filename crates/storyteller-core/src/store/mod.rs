//! Single-record key-value persistence engines.
//!
//! Engines only ever see whole records: a value is read or replaced as a
//! unit, never patched.

mod file;
mod memory;

pub use file::FileRecordStore;
pub use memory::MemoryRecordStore;

use crate::errors::StoreError;

/// Key-value engine holding named JSON records.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Returns the record stored under `key`, if any.
    async fn read(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError>;

    /// Replaces the record under `key`. Durable once this returns `Ok`.
    async fn write(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError>;
}
