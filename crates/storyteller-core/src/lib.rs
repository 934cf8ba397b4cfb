pub mod app;
pub mod cache;
pub mod config;
pub mod errors;
pub mod observability;
pub mod store;

// Minimal user-facing API: StoryApp, AppConfig, CatalogCache and the store engines.
pub use app::{AppState, LoadOutcome, LoadState, StoryApp, SubmitOutcome};
pub use cache::{CATALOG_RECORD_KEY, CatalogCache};
pub use config::AppConfig;
pub use errors::StoreError;
pub use store::{FileRecordStore, MemoryRecordStore, RecordStore};
