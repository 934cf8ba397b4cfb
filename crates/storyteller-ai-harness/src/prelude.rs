//! Common imports for typical client usage.
//!
//! Exports the types most callers need so front ends can get by with a single
//! glob import.
pub use crate::{
    CatalogClient, CatalogEntry, CatalogSource, ClientError, ClientMode, Credential,
    GeminiClientConfig, GenerationClient, GenerationClientBuilder, HttpTransport, Role, Turn,
};
