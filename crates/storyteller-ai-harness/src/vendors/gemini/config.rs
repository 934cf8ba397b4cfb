use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_API_VERSION: &str = "v1beta";

/// Endpoint configuration for the Gemini API.
#[derive(Clone, Debug)]
pub struct GeminiClientConfig {
    /// Base URL of the API.
    ///
    /// Useful for proxies or local test servers.
    pub base_url: String,
    /// API version path segment (for example `v1beta`).
    pub api_version: String,
    /// Default HTTP timeout for requests.
    pub timeout: Duration,
}

impl Default for GeminiClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

impl GeminiClientConfig {
    /// Overrides the API base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Overrides the API version segment.
    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Overrides the default HTTP timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn root(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.api_version.trim_matches('/')
        )
    }

    pub(crate) fn generate_url(&self, model_id: &str) -> String {
        let model = model_id.trim();
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!("{}/models/{model}:generateContent", self.root())
    }

    pub(crate) fn models_url(&self) -> String {
        format!("{}/models", self.root())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_url_normalises_model_prefix() {
        let config = GeminiClientConfig::default();
        assert_eq!(
            config.generate_url("models/gemini-1.5-pro-latest"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-pro-latest:generateContent"
        );
        assert_eq!(
            config.generate_url("gemini-1.5-pro-latest"),
            config.generate_url("models/gemini-1.5-pro-latest")
        );
    }

    #[test]
    fn base_url_override_tolerates_trailing_slash() {
        let config = GeminiClientConfig::default().base_url("http://127.0.0.1:8080/");
        assert_eq!(config.models_url(), "http://127.0.0.1:8080/v1beta/models");
    }
}
