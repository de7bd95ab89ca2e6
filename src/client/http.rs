//! HTTP client implementation for the GBM REST APIs.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde_json::Value;

use crate::api::{AuthService, GbmpService, V1Service, V2Service};
use crate::auth::{AuthClient, MfaCodeProvider, Session, SessionStore};
use crate::models::HttpMethod;
use crate::{Error, Result};

use super::config::{Api, ClientConfig};

/// The main client for the GBM REST APIs.
///
/// The client owns the session and hands a shared, read-only reference to
/// every service it creates. Each service call issues exactly one request.
///
/// # Example
///
/// ```no_run
/// use gbm::{ClientConfig, ContractId, GbmClient};
///
/// # async fn example() -> gbm::Result<()> {
/// let client = GbmClient::from_saved_session("user@example.com", ClientConfig::default())?;
///
/// let contracts = client.v1().contracts().await?;
/// let accounts = client.v2().accounts(&ContractId::new("123456")).await?;
/// # Ok(())
/// # }
/// ```
pub struct GbmClient {
    pub(crate) inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    pub(crate) http: reqwest::Client,
    pub(crate) session: Option<Arc<Session>>,
    pub(crate) config: ClientConfig,
}

/// How a request is authorized.
#[derive(Debug, Clone, Default)]
pub(crate) enum AuthMode {
    /// Attach the session's access header; fail without a session.
    #[default]
    Required,
    /// Attach the access header when a session is present.
    Optional,
    /// Send this exact `Authorization` value.
    Header(String),
}

/// Everything about a request besides its verb and path.
#[derive(Debug, Default)]
pub(crate) struct RequestOptions<'a> {
    pub(crate) query: Vec<(&'a str, String)>,
    pub(crate) body: Option<Value>,
    pub(crate) auth: AuthMode,
}

impl<'a> RequestOptions<'a> {
    pub(crate) fn query(mut self, key: &'a str, value: impl ToString) -> Self {
        self.query.push((key, value.to_string()));
        self
    }

    pub(crate) fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub(crate) fn auth(mut self, auth: AuthMode) -> Self {
        self.auth = auth;
        self
    }
}

impl GbmClient {
    /// Create a client without a session.
    ///
    /// Only the ungated auth endpoints work; every other call fails with
    /// [`Error::MissingSession`].
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = config.build_http()?;
        Ok(Self::with_http_client(http, None, config))
    }

    /// Create a client around an existing session.
    pub fn with_session(session: Session, config: ClientConfig) -> Result<Self> {
        let http = config.build_http()?;
        Ok(Self::with_http_client(http, Some(Arc::new(session)), config))
    }

    /// Create a client with a caller-supplied HTTP transport.
    ///
    /// Use this to share a transport whose cookie jar was primed elsewhere.
    pub fn with_http_client(
        http: reqwest::Client,
        session: Option<Arc<Session>>,
        config: ClientConfig,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                http,
                session,
                config,
            }),
        }
    }

    /// Log in with credentials and an MFA code source.
    pub async fn login<P: MfaCodeProvider>(
        user: &str,
        password: &str,
        codes: &mut P,
        config: ClientConfig,
    ) -> Result<Self> {
        let http = config.build_http()?;
        let auth = AuthClient::with_http_client(http.clone(), config.clone());
        let session = auth.login(user, password, codes).await?;
        Ok(Self::with_http_client(http, Some(Arc::new(session)), config))
    }

    /// Rebuild a client from the session saved for `user`.
    ///
    /// The session is not checked for expiry.
    pub fn from_saved_session(user: &str, config: ClientConfig) -> Result<Self> {
        let store = SessionStore::resolve(config.preferences_dir.as_deref())?;
        let session = store.load(user)?;
        Self::with_session(session, config)
    }

    /// Get the v1 service.
    pub fn v1(&self) -> V1Service {
        V1Service::new(self.inner.clone())
    }

    /// Get the v2 service.
    pub fn v2(&self) -> V2Service {
        V2Service::new(self.inner.clone())
    }

    /// Get the GBMP service.
    pub fn gbmp(&self) -> GbmpService {
        GbmpService::new(self.inner.clone())
    }

    /// Get the session-gated auth API service.
    pub fn auth(&self) -> AuthService {
        AuthService::new(self.inner.clone())
    }

    /// An auth client sharing this client's transport and configuration.
    pub fn auth_client(&self) -> AuthClient {
        AuthClient::with_http_client(self.inner.http.clone(), self.inner.config.clone())
    }

    /// Persist the current session to the preferences directory.
    pub fn save_session(&self) -> Result<std::path::PathBuf> {
        let session = self.inner.require_session()?;
        let store = SessionStore::resolve(self.inner.config.preferences_dir.as_deref())?;
        store.save(session)
    }

    /// Tear down the current session on the server.
    pub async fn logout(&self) -> Result<()> {
        let session = self.inner.require_session()?;
        self.auth_client().logout(session).await
    }

    /// Get a reference to the session, if any.
    pub fn session(&self) -> Option<&Session> {
        self.inner.session.as_deref()
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }
}

impl ClientInner {
    pub(crate) fn require_session(&self) -> Result<&Session> {
        self.session.as_deref().ok_or(Error::MissingSession)
    }

    /// Build request headers for the given authorization mode.
    pub(crate) fn build_headers(&self, auth: &AuthMode) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let authorization = match auth {
            AuthMode::Required => Some(self.require_session()?.access_header()),
            AuthMode::Optional => self.session.as_deref().map(Session::access_header),
            AuthMode::Header(value) => Some(value.clone()),
        };

        if let Some(value) = authorization {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&value)
                    .map_err(|_| Error::InvalidInput("Invalid token format".to_string()))?,
            );
        }

        Ok(headers)
    }

    /// Issue a request and return the raw response, whatever its status.
    pub(crate) async fn send(
        &self,
        api: Api,
        method: HttpMethod,
        path: &str,
        options: RequestOptions<'_>,
    ) -> Result<reqwest::Response> {
        // Header construction fails first for gated calls, before any I/O.
        let headers = self.build_headers(&options.auth)?;
        let url = self.config.endpoints.url(api, path);

        tracing::debug!(?method, %url, "Sending request");

        let mut request = self
            .http
            .request(method.as_reqwest(), &url)
            .headers(headers);
        if !options.query.is_empty() {
            request = request.query(&options.query);
        }
        if let Some(body) = &options.body {
            request = request.json(body);
        }

        Ok(request.send().await?)
    }

    /// Issue a request and return its JSON body.
    pub(crate) async fn request(
        &self,
        api: Api,
        method: HttpMethod,
        path: &str,
        options: RequestOptions<'_>,
    ) -> Result<Value> {
        let response = self.send(api, method, path, options).await?;
        handle_response(response, |status, body| Error::RemoteCallFailed { status, body }).await
    }

    /// Make a GET request.
    pub(crate) async fn get(&self, api: Api, path: &str) -> Result<Value> {
        self.request(api, HttpMethod::Get, path, RequestOptions::default())
            .await
    }

    /// Make a GET request with query parameters.
    pub(crate) async fn get_with_query(
        &self,
        api: Api,
        path: &str,
        query: Vec<(&str, String)>,
    ) -> Result<Value> {
        let options = RequestOptions {
            query,
            ..Default::default()
        };
        self.request(api, HttpMethod::Get, path, options).await
    }

    /// Make a POST request.
    pub(crate) async fn post(&self, api: Api, path: &str, body: Value) -> Result<Value> {
        self.request(api, HttpMethod::Post, path, RequestOptions::default().body(body))
            .await
    }

    /// Make a DELETE request.
    pub(crate) async fn delete(&self, api: Api, path: &str) -> Result<Value> {
        self.request(api, HttpMethod::Delete, path, RequestOptions::default())
            .await
    }

    /// Make an OPTIONS request.
    pub(crate) async fn options(&self, api: Api, path: &str) -> Result<Value> {
        self.request(api, HttpMethod::Options, path, RequestOptions::default())
            .await
    }
}

/// Turn a response into its JSON body, or into the error `on_failure`
/// builds from the status and raw body.
///
/// An empty success body becomes `Value::Null`.
pub(crate) async fn handle_response(
    response: reqwest::Response,
    on_failure: impl FnOnce(u16, String) -> Error,
) -> Result<Value> {
    let status = response.status();
    let url = response.url().clone();
    let body = response.text().await?;

    if !status.is_success() {
        tracing::warn!(status = status.as_u16(), %url, "Request failed");
        return Err(on_failure(status.as_u16(), body));
    }

    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&body)?)
}

/// Percent-encode a value for use inside a URL path.
///
/// Unreserved characters and `/` pass through, everything else is
/// `%XX`-escaped byte by byte.
pub(crate) fn quote(segment: &str) -> String {
    segment
        .split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

impl Clone for GbmClient {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl std::fmt::Debug for GbmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GbmClient")
            .field("config", &self.inner.config)
            .field("session", &self.inner.session)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session() -> Session {
        Session::new(
            "alice",
            &json!({
                "accessToken": "a",
                "identityToken": "i",
                "refreshToken": "r",
                "tokenType": "Bearer",
                "expiresIn": 1200,
            }),
        )
        .unwrap()
    }

    #[test]
    fn test_headers_with_session() {
        let client = GbmClient::with_session(session(), ClientConfig::default()).unwrap();
        let headers = client.inner.build_headers(&AuthMode::Required).unwrap();
        assert_eq!(headers[ACCEPT], "application/json");
        assert_eq!(headers[AUTHORIZATION], "Bearer a");
    }

    #[test]
    fn test_headers_without_session() {
        let client = GbmClient::new(ClientConfig::default()).unwrap();

        assert!(matches!(
            client.inner.build_headers(&AuthMode::Required),
            Err(Error::MissingSession)
        ));

        let headers = client.inner.build_headers(&AuthMode::Optional).unwrap();
        assert!(headers.get(AUTHORIZATION).is_none());

        let headers = client
            .inner
            .build_headers(&AuthMode::Header("Bearer r".into()))
            .unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer r");
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("AC *"), "AC%20%2A");
        assert_eq!(quote("GFINBUR O"), "GFINBUR%20O");
        assert_eq!(quote("a/b"), "a/b");
        assert_eq!(quote("Índice"), "%C3%8Dndice");
        assert_eq!(quote("/a//b/"), "/a//b/");
        assert_eq!(quote("x?y#z%"), "x%3Fy%23z%25");
        assert_eq!(quote("A-z_0.9~"), "A-z_0.9~");
    }

    #[test]
    fn test_debug_hides_tokens() {
        let client = GbmClient::with_session(session(), ClientConfig::default()).unwrap();
        let debug_str = format!("{:?}", client);
        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("\"a\""));
    }
}
