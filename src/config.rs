use std::path::PathBuf;
use std::time::Duration;

/// Client configuration. Loaded from the environment by `load()`, or built
/// directly in tests with `ClientConfig::new(base_url)`.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root, e.g. `https://api.culturalite.com/api`. Auth endpoints hang
    /// off this at `/auth/...`.
    pub base_url: String,
    /// Total timeout for ordinary requests, seconds.
    pub request_timeout_secs: u64,
    /// Timeout for the token-refresh call. Bounded and short: a hung refresh
    /// stalls every queued request behind it.
    pub refresh_timeout_secs: u64,
    /// Namespace prefix for persisted keys.
    pub storage_prefix: String,
    /// Where the file-backed token store lives. None = in-memory only.
    pub storage_path: Option<PathBuf>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout_secs: 30,
            refresh_timeout_secs: 10,
            storage_prefix: "culturalite.".to_string(),
            storage_path: None,
        }
    }

    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_secs(self.refresh_timeout_secs)
    }

    /// Build the one shared HTTP client. The cookie jar is enabled because
    /// the server delivers the refresh credential as an httpOnly cookie; the
    /// client never reads it, only carries it.
    pub fn build_http_client(&self) -> Result<reqwest::Client, ConfigError> {
        reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(self.request_timeout_secs))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(ConfigError::HttpClient)
    }
}

pub fn load() -> Result<ClientConfig, ConfigError> {
    dotenvy::dotenv().ok();

    let base_url = std::env::var("CULTURALITE_API_URL")
        .unwrap_or_else(|_| "http://localhost:8000/api".into());

    // Validate early; a bad base URL otherwise surfaces as a confusing
    // network error on the first request.
    url::Url::parse(&base_url).map_err(|e| ConfigError::InvalidBaseUrl {
        url: base_url.clone(),
        source: e,
    })?;

    Ok(ClientConfig {
        base_url,
        request_timeout_secs: std::env::var("CULTURALITE_REQUEST_TIMEOUT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30),
        refresh_timeout_secs: std::env::var("CULTURALITE_REFRESH_TIMEOUT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10),
        storage_prefix: std::env::var("CULTURALITE_STORAGE_PREFIX")
            .unwrap_or_else(|_| "culturalite.".into()),
        storage_path: std::env::var("CULTURALITE_STORAGE_PATH")
            .ok()
            .map(PathBuf::from),
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid base URL {url:?}: {source}")]
    InvalidBaseUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = ClientConfig::new("http://localhost:8000/api");
        assert_eq!(cfg.request_timeout_secs, 30);
        assert_eq!(cfg.refresh_timeout_secs, 10);
        assert_eq!(cfg.storage_prefix, "culturalite.");
        assert!(cfg.storage_path.is_none());
    }

    #[test]
    fn http_client_builds_from_defaults() {
        let cfg = ClientConfig::new("http://localhost:8000/api");
        assert!(cfg.build_http_client().is_ok());
    }
}
