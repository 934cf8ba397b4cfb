use std::{env, path::Path, path::PathBuf, time::Duration};

use storyteller_ai_harness::{ClientMode, Credential, GeminiClientConfig};

/// Load `.env` files next to the crate manifest and in the working directory.
pub fn init() {
    let _ = dotenvy::from_path(Path::new(
        format!("{}/.env", env!("CARGO_MANIFEST_DIR")).as_str(),
    ));
    dotenvy::dotenv().ok();
}

/// Get an environment variable parsed as `T`, or `T::default()` when unset or
/// unparseable.
pub fn get_env<T: std::str::FromStr + Default>(key: &str) -> T {
    match env::var(key) {
        Ok(s) if !s.trim().is_empty() => match s.trim().parse() {
            Ok(val) => val,
            Err(_) => {
                tracing::error!("Error parsing {}", key);
                T::default()
            }
        },
        _ => T::default(),
    }
}

fn get_env_or<T: std::str::FromStr>(key: &str, fallback: T) -> T {
    match env::var(key) {
        Ok(s) if !s.trim().is_empty() => s.trim().parse().unwrap_or_else(|_| {
            tracing::error!("Error parsing {}", key);
            fallback
        }),
        _ => fallback,
    }
}

/// Runtime settings for one play session.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: Credential,
    pub mode: ClientMode,
    /// Model to select after a load when the catalog lists it.
    pub preferred_model: Option<String>,
    pub data_dir: PathBuf,
    pub api_base_url: Option<String>,
    pub http_timeout: Duration,
    pub stub_delay: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: Credential::default(),
            mode: ClientMode::Live,
            preferred_model: None,
            data_dir: PathBuf::from(".storyteller"),
            api_base_url: None,
            http_timeout: Duration::from_secs(120),
            stub_delay: storyteller_ai_harness::stub::DEFAULT_STUB_DELAY,
        }
    }
}

impl AppConfig {
    /// Reads `GEMINI_API_KEY`, `STORYTELLER_*` and `GEMINI_API_BASE_URL`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let preferred_model: String = get_env("STORYTELLER_MODEL");
        let api_base_url: String = get_env("GEMINI_API_BASE_URL");
        Self {
            api_key: Credential::from_env("GEMINI_API_KEY"),
            mode: get_env_or("STORYTELLER_MODE", defaults.mode),
            preferred_model: Some(preferred_model).filter(|m| !m.is_empty()),
            data_dir: get_env_or("STORYTELLER_DATA_DIR", defaults.data_dir),
            api_base_url: Some(api_base_url).filter(|u| !u.is_empty()),
            http_timeout: Duration::from_secs(get_env_or(
                "STORYTELLER_HTTP_TIMEOUT_SECS",
                defaults.http_timeout.as_secs(),
            )),
            stub_delay: Duration::from_millis(get_env_or(
                "STORYTELLER_STUB_DELAY_MS",
                defaults.stub_delay.as_millis() as u64,
            )),
        }
    }

    /// Endpoint settings derived from this config.
    pub fn gemini_config(&self) -> GeminiClientConfig {
        let config = GeminiClientConfig::default().timeout(self.http_timeout);
        match &self.api_base_url {
            Some(url) => config.base_url(url.clone()),
            None => config,
        }
    }
}
