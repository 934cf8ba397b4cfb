/// Errors returned by the generation client and the catalog fetch.
///
/// The message of every variant is meant to be shown to the player as-is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// Caller input rejected before any state change.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// No usable API credential at the point a live call needs one.
    #[error("missing API key: set GEMINI_API_KEY to a valid key")]
    MissingCredential,
    /// A live generation call was made without a model id.
    #[error("no model selected")]
    MissingModel,
    /// The remote endpoint answered with a non-success status.
    #[error("request failed with status {status}: {detail}{}", guidance_suffix(.guidance))]
    RemoteRequestFailed {
        status: u16,
        /// Best-effort message from the response body, or the status text.
        detail: String,
        /// Advice for well-known statuses.
        guidance: Option<&'static str>,
    },
    /// The exchange itself failed (connect, timeout, body read).
    #[error("network error: {0}")]
    Transport(String),
    /// Success status but the payload matched no known response shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    /// The client could not be configured.
    #[error("config error: {0}")]
    Config(String),
}

impl ClientError {
    /// HTTP status for remote failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RemoteRequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn guidance_suffix(guidance: &Option<&'static str>) -> String {
    guidance.map(|g| format!(" ({g})")).unwrap_or_default()
}
