//! Client configuration options.

use std::path::PathBuf;
use std::time::Duration;

use crate::Result;

/// Client identifier the auth service expects on every call.
///
/// Override it with the `GBM_CLIENT_ID` environment variable or
/// [`ClientConfig::with_client_id`].
pub const DEFAULT_CLIENT_ID: &str = "gbm-trading-pro";

/// Environment variable that overrides [`DEFAULT_CLIENT_ID`].
pub const CLIENT_ID_ENV: &str = "GBM_CLIENT_ID";

/// Application name sent with the MFA challenge answer.
pub const APPLICATION_NAME: &str = "GBM+ Trading Pro";

/// The API generations this crate talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Api {
    /// `auth.gbm.com/api/v1`: login, logout, token introspection
    AuthV1,
    /// `api.gbm.com/v1`
    V1,
    /// `api.gbm.com/v2`
    V2,
    /// `homebroker-api.gbm.com/GBMP/api`
    Gbmp,
}

/// Base URLs for every API generation.
///
/// # Example
///
/// ```
/// use gbm::{Api, Endpoints};
///
/// let endpoints = Endpoints::default();
/// assert_eq!(endpoints.base_url(Api::V2), "https://api.gbm.com/v2");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Auth API base
    pub auth_v1: String,
    /// v1 REST base
    pub v1: String,
    /// v2 REST base
    pub v2: String,
    /// GBMP REST base
    pub gbmp: String,
    /// Host of the legacy digital API, with a trailing slash
    pub legacy_host: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            auth_v1: "https://auth.gbm.com/api/v1".to_string(),
            v1: "https://api.gbm.com/v1".to_string(),
            v2: "https://api.gbm.com/v2".to_string(),
            gbmp: "https://homebroker-api.gbm.com/GBMP/api".to_string(),
            legacy_host: "https://www.gbmhomebroker.com/".to_string(),
        }
    }
}

impl Endpoints {
    /// Lay every API out under a single host, keeping the upstream paths.
    ///
    /// Used to point the client at a local mock server.
    pub fn under(host: &str) -> Self {
        let host = host.trim_end_matches('/');
        Self {
            auth_v1: format!("{}/api/v1", host),
            v1: format!("{}/v1", host),
            v2: format!("{}/v2", host),
            gbmp: format!("{}/GBMP/api", host),
            legacy_host: format!("{}/", host),
        }
    }

    /// Base URL for the given API generation.
    pub fn base_url(&self, api: Api) -> &str {
        match api {
            Api::AuthV1 => &self.auth_v1,
            Api::V1 => &self.v1,
            Api::V2 => &self.v2,
            Api::Gbmp => &self.gbmp,
        }
    }

    /// Full URL for `segment` under the given API generation.
    pub fn url(&self, api: Api, segment: &str) -> String {
        format!("{}{}", self.base_url(api), segment)
    }
}

/// Configuration for the GBM clients.
///
/// # Example
///
/// ```
/// use gbm::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::default()
///     .with_timeout(Duration::from_secs(60))
///     .with_user_agent("my-app/1.0");
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout
    pub timeout: Duration,
    /// User-Agent header value
    pub user_agent: String,
    /// Client identifier sent to the auth service
    pub client_id: String,
    /// Application name sent with the MFA answer
    pub application_name: String,
    /// Base URLs
    pub endpoints: Endpoints,
    /// Where sessions are persisted; `None` resolves it from the environment
    pub preferences_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("gbm-rs/{} (Rust)", env!("CARGO_PKG_VERSION")),
            client_id: std::env::var(CLIENT_ID_ENV)
                .unwrap_or_else(|_| DEFAULT_CLIENT_ID.to_string()),
            application_name: APPLICATION_NAME.to_string(),
            endpoints: Endpoints::default(),
            preferences_dir: None,
        }
    }
}

impl ClientConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the client identifier.
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    /// Replace the base URLs.
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Persist sessions under `dir` instead of the default location.
    pub fn with_preferences_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.preferences_dir = Some(dir.into());
        self
    }

    /// Build the HTTP transport described by this configuration.
    ///
    /// The cookie store stays on: the upstream edge hands out bot-detection
    /// cookies that have to be replayed.
    pub fn build_http(&self) -> Result<reqwest::Client> {
        Ok(reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .cookie_store(true)
            .build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.application_name, "GBM+ Trading Pro");
        assert!(config.preferences_dir.is_none());
        assert!(!config.client_id.is_empty());
    }

    #[test]
    fn test_default_endpoints() {
        let endpoints = Endpoints::default();
        assert_eq!(
            endpoints.url(Api::AuthV1, "/session/user"),
            "https://auth.gbm.com/api/v1/session/user"
        );
        assert_eq!(
            endpoints.url(Api::Gbmp, "/x"),
            "https://homebroker-api.gbm.com/GBMP/api/x"
        );
    }

    #[test]
    fn test_endpoints_under_mock_host() {
        let endpoints = Endpoints::under("http://127.0.0.1:4000/");
        assert_eq!(endpoints.url(Api::V1, "/contracts"), "http://127.0.0.1:4000/v1/contracts");
        assert_eq!(endpoints.base_url(Api::AuthV1), "http://127.0.0.1:4000/api/v1");
        assert_eq!(endpoints.legacy_host, "http://127.0.0.1:4000/");
    }

    #[test]
    fn test_builder_overrides() {
        let config = ClientConfig::new()
            .with_client_id("abc")
            .with_preferences_dir("/tmp/gbm");
        assert_eq!(config.client_id, "abc");
        assert_eq!(config.preferences_dir, Some(PathBuf::from("/tmp/gbm")));
    }
}
