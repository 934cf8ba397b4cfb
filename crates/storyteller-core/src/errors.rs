/// Failures of the local persistence engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The engine could not be opened (missing directory permissions,
    /// incompatible schema, ...).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    /// A read or write against an open engine failed.
    #[error("storage operation failed: {0}")]
    OperationFailed(String),
}
