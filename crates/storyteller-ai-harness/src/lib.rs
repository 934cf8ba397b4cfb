//! Transcript-consistent generation client for the storyteller front end.
//!
//! Vendor-specific wire formats live under `vendors::*`; the root API is the
//! session-bound [`GenerationClient`] plus the [`HttpTransport`] seam it talks
//! through.
//!
//! # Usage
//!
//! ```no_run
//! use storyteller_ai_harness::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), ClientError> {
//! let client = GenerationClient::builder()
//!     .credential(Credential::from_env("GEMINI_API_KEY"))
//!     .mode(ClientMode::Live)
//!     .build()?;
//!
//! client.initialize_history(&[Turn::model("You wake in a lighthouse.")]);
//! let reply = client
//!     .submit_turn("climb the stairs", "gemini-1.5-flash-latest")
//!     .await?;
//! println!("{reply}");
//! # Ok(())
//! # }
//! ```

/// Catalog source contract and the stub catalog.
pub mod catalog;
/// The session-bound generation client and its builder.
pub mod client;
/// Transcript turn types.
pub mod content;
/// Public error types.
pub mod errors;
/// Credentials, client mode and catalog entries.
pub mod model;
/// Common imports for typical usage.
pub mod prelude;
/// Deterministic local simulation used in stub mode.
pub mod stub;
/// HTTP transport contract and the reqwest implementation.
pub mod transport;
/// Vendor-specific integrations.
pub mod vendors;

pub use catalog::{CatalogSource, StubCatalog};
pub use client::{GenerationClient, GenerationClientBuilder};
pub use content::{Part, Role, Turn};
pub use errors::ClientError;
pub use model::{CatalogEntry, ClientMode, Credential};
pub use transport::{HttpReply, HttpTransport, ReqwestTransport};
pub use vendors::gemini::{CatalogClient, GeminiClientConfig};
