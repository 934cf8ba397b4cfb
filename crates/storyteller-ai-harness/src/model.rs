use std::fmt;

/// Values shipped in sample configs that must never reach the API.
const PLACEHOLDER_CREDENTIALS: &[&str] = &[
    "YOUR_API_KEY",
    "YOUR_GEMINI_API_KEY",
    "API_KEY_HERE",
    "<api-key>",
];

/// Opaque API credential.
///
/// Never printed: `Debug` redacts the value.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wraps a raw credential string. Blank values are allowed.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Reads a credential from an environment variable, blank when unset.
    pub fn from_env(key: &str) -> Self {
        Self::new(std::env::var(key).unwrap_or_default())
    }

    /// Returns the raw credential.
    pub fn as_str(&self) -> &str {
        self.0.trim()
    }

    /// Whether the credential is present and not a known placeholder.
    pub fn is_usable(&self) -> bool {
        let value = self.0.trim();
        !value.is_empty() && !PLACEHOLDER_CREDENTIALS.contains(&value)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_usable() {
            f.write_str("Credential(<redacted>)")
        } else {
            f.write_str("Credential(<unset>)")
        }
    }
}

impl From<&str> for Credential {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Credential {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Whether the client talks to the remote service or simulates it locally.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientMode {
    /// Calls the remote generation endpoint.
    #[default]
    Live,
    /// Deterministic local simulation, no network I/O.
    Stub,
}

impl std::str::FromStr for ClientMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" => Ok(Self::Live),
            "stub" | "mock" | "offline" => Ok(Self::Stub),
            other => Err(format!("unknown client mode: {other}")),
        }
    }
}

/// One selectable backend model.
///
/// Identity is `id`; display order is lexicographic by `display_name`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    /// Stable identifier used in generation requests.
    pub id: String,
    /// Human label.
    pub display_name: String,
    /// May be empty.
    #[serde(default)]
    pub description: String,
    /// Optional human-readable category.
    #[serde(default)]
    pub tier: Option<String>,
}
