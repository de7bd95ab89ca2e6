//! Session lifecycle of the legacy digital API.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use reqwest::header::{HeaderMap, HeaderName};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

use crate::auth::{from_epoch_seconds, to_epoch_seconds, SessionStore};
use crate::client::ClientConfig;
use crate::models::HttpMethod;
use crate::{Error, Result};

use super::common::{
    forwarded_headers, header_value, is_truthy, LegacyInner, LegacyTransport, APPLICATION_ID,
    IDENTITY_HASH, IDENTITY_USER,
};
use super::security::{Security, Utilities};
use super::LegacyApi;

const START_SESSION_PATH: &str = "HBPro/loadPartial/Account/StartSession";
const CLOSE_SESSION_PATH: &str = "HBPro/loadPartial/Account/CloseSession";

/// What `SignIn` returns for valid credentials.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigninPayload {
    /// Numeric user id, kept as a string so it can travel in a header
    #[serde(deserialize_with = "string_or_number")]
    pub user: String,
    /// Identity hash sent with every authenticated call
    pub hash: String,
    /// The user's email
    #[serde(default)]
    pub alias: Option<String>,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Level 2 market data entitlement
    #[serde(default)]
    pub has_level2: bool,
    /// Whether the session may trade
    #[serde(default)]
    pub is_read_and_write: bool,
    /// Read-only session window, in minutes
    pub time_expires_read_session: i64,
    /// Trading session window, in minutes
    #[serde(default)]
    pub time_expires_operation_session: i64,
    /// Profile picture, as sent
    #[serde(default)]
    pub photo: Option<Value>,
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or a number, got {}",
            other
        ))),
    }
}

impl std::fmt::Debug for SigninPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigninPayload")
            .field("user", &self.user)
            .field("hash", &"[REDACTED]")
            .field("alias", &self.alias)
            .field("has_level2", &self.has_level2)
            .field("is_read_and_write", &self.is_read_and_write)
            .field("time_expires_read_session", &self.time_expires_read_session)
            .finish()
    }
}

/// Interpret the body `SignIn` answered with.
pub(crate) fn parse_signin(payload: Value) -> Result<SigninPayload> {
    if let Some(code) = payload.get("ErrorCode") {
        return Err(match payload.get("ErrorMessage") {
            Some(message) => {
                let message = message
                    .as_str()
                    .map(String::from)
                    .unwrap_or_else(|| message.to_string());
                Error::LegacySession(format!("{} <code: {}>", message, code))
            }
            None => Error::LegacySession(format!("Unable to authenticate: {}", payload)),
        });
    }
    if payload.get("user").is_none() {
        return Err(Error::LegacySession(format!("Unexpected payload: {}", payload)));
    }
    let signin: SigninPayload = serde_json::from_value(payload.clone())
        .map_err(|e| Error::LegacySession(format!("Unexpected payload ({}): {}", e, payload)))?;
    read_window(&signin)?;
    Ok(signin)
}

/// The read session window of a sign-in, checked to be representable.
fn read_window(signin: &SigninPayload) -> Result<Duration> {
    Duration::try_minutes(signin.time_expires_read_session).ok_or_else(|| {
        Error::LegacySession(format!(
            "timeExpiresReadSession {} is out of range",
            signin.time_expires_read_session
        ))
    })
}

/// An authenticated session with the legacy digital API.
///
/// The legacy service tracks an application session and an account session
/// separately; [`start`](Self::start) opens both and [`stop`](Self::stop)
/// closes both.
///
/// # Example
///
/// ```no_run
/// use gbm::legacy::LegacySession;
/// use gbm::ClientConfig;
///
/// # async fn example() -> gbm::Result<()> {
/// let mut session = LegacySession::start("user@example.com", "secret", &ClientConfig::default()).await?;
/// let positions = session.api()?.contract_management().contracts_bp().await?;
///
/// session.slide().await?;
/// println!("{} minutes left", session.remaining().num_minutes());
/// session.stop().await?;
/// # Ok(())
/// # }
/// ```
pub struct LegacySession {
    user: String,
    public_ip: String,
    user_key: String,
    signin: SigninPayload,
    read_window: Duration,
    start_ts: DateTime<Utc>,
    last_slide_ts: Option<DateTime<Utc>>,
    transport: LegacyTransport,
    autosave: Option<SessionStore>,
    stopped: bool,
}

impl LegacySession {
    /// Sign in and open the account session.
    pub async fn start(user: &str, password: &str, config: &ClientConfig) -> Result<Self> {
        let http = config.build_http()?;
        Self::start_with_http_client(user, password, http, &config.endpoints.legacy_host).await
    }

    /// Like [`start`](Self::start), on a caller-supplied transport and host.
    pub async fn start_with_http_client(
        user: &str,
        password: &str,
        http: reqwest::Client,
        host: &str,
    ) -> Result<Self> {
        tracing::info!(user, "Starting legacy session");
        let transport = LegacyTransport::new(http, host);
        let bare = Arc::new(LegacyInner {
            transport: transport.clone(),
            headers: None,
        });

        let public_ip = Utilities::new(bare.clone()).public_ip().await?;
        let security = Security::new(bare);
        let user_key = security.user_key(user, Some(&public_ip)).await?;

        let payload = match security.sign_in(&user_key, password, Some(&public_ip)).await {
            Ok(payload) => payload,
            // Rejected credentials may come back as an error status with the
            // same ErrorCode body.
            Err(Error::RemoteCallFailed { body, .. })
                if serde_json::from_str::<Value>(&body)
                    .map(|v| v.get("ErrorCode").is_some())
                    .unwrap_or(false) =>
            {
                serde_json::from_str(&body)?
            }
            Err(e) => return Err(e),
        };
        let signin = parse_signin(payload)?;
        let read_window = read_window(&signin)?;

        let mut session = Self {
            user: user.to_string(),
            public_ip,
            user_key,
            signin,
            read_window,
            start_ts: Utc::now(),
            last_slide_ts: None,
            transport,
            autosave: None,
            stopped: false,
        };
        session.start_account_session().await?;
        session.start_ts = Utc::now();

        tracing::info!(user, "Legacy session started");
        Ok(session)
    }

    /// Rebuild a session from a pack, on a fresh transport.
    ///
    /// # Errors
    ///
    /// [`Error::LegacySession`] if the pack's session window has already
    /// elapsed or does not fit a representable time.
    pub fn from_pack(pack: SessionPack, config: &ClientConfig) -> Result<Self> {
        let http = config.build_http()?;
        Self::from_pack_with_http_client(pack, http, &config.endpoints.legacy_host)
    }

    /// Like [`from_pack`](Self::from_pack), on a caller-supplied transport
    /// and host.
    pub fn from_pack_with_http_client(
        pack: SessionPack,
        http: reqwest::Client,
        host: &str,
    ) -> Result<Self> {
        let start_ts = from_epoch_seconds(pack.start_ts)
            .ok_or_else(|| Error::LegacySession(format!("Invalid start time {}", pack.start_ts)))?;
        let last_slide_ts = match pack.last_slide_ts {
            Some(ts) => Some(
                from_epoch_seconds(ts)
                    .ok_or_else(|| Error::LegacySession(format!("Invalid slide time {}", ts)))?,
            ),
            None => None,
        };

        let read_window = read_window(&pack.signin_payload)?;
        let session = Self {
            user: pack.user,
            public_ip: pack.public_ip,
            user_key: pack.user_key,
            signin: pack.signin_payload,
            read_window,
            start_ts,
            last_slide_ts,
            transport: LegacyTransport::new(http, host),
            autosave: None,
            stopped: false,
        };

        let remaining = session.remaining();
        if remaining <= Duration::zero() {
            return Err(Error::LegacySession(format!(
                "The saved session has already expired ({} minutes ago)",
                -remaining.num_minutes()
            )));
        }
        Ok(session)
    }

    /// Save the session pack to `store` now and after every slide.
    pub fn with_autosave(mut self, store: SessionStore) -> Result<Self> {
        self.export().save(&store)?;
        self.autosave = Some(store);
        Ok(self)
    }

    /// The user the session was started for.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// The public address the session is bound to.
    pub fn public_ip(&self) -> &str {
        &self.public_ip
    }

    /// The sign-in payload.
    pub fn signin(&self) -> &SigninPayload {
        &self.signin
    }

    /// When the session was started.
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_ts
    }

    /// When the session was last slid, if ever.
    pub fn last_slide_time(&self) -> Option<DateTime<Utc>> {
        self.last_slide_ts
    }

    /// Time left in the read session window. Negative once elapsed.
    pub fn remaining(&self) -> Duration {
        self.remaining_at(Utc::now())
    }

    /// Time left in the read session window as of `now`.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Duration {
        let from = self.last_slide_ts.unwrap_or(self.start_ts);
        from.checked_add_signed(self.read_window)
            .map_or(Duration::MAX, |end| end.signed_duration_since(now))
    }

    /// Headers that authenticate a legacy API call.
    ///
    /// Fails with [`Error::MissingSession`] once the session is stopped.
    pub fn headers(&self) -> Result<HeaderMap> {
        if self.stopped {
            return Err(Error::MissingSession);
        }
        let mut headers = forwarded_headers(&self.transport.host, &self.public_ip)?;
        headers.insert(
            HeaderName::from_static(IDENTITY_USER),
            header_value(&self.signin.user)?,
        );
        headers.insert(
            HeaderName::from_static(IDENTITY_HASH),
            header_value(&self.signin.hash)?,
        );
        Ok(headers)
    }

    /// The endpoint segments, bound to this session.
    pub fn api(&self) -> Result<LegacyApi> {
        Ok(LegacyApi::from_inner(Arc::new(self.inner()?)))
    }

    fn inner(&self) -> Result<LegacyInner> {
        Ok(LegacyInner {
            transport: self.transport.clone(),
            headers: Some(self.headers()?),
        })
    }

    /// Extend the session on the server.
    pub async fn slide(&mut self) -> Result<()> {
        let result = Security::new(Arc::new(self.inner()?))
            .slide_session()
            .await?;
        if !is_truthy(&result) {
            return Err(Error::LegacySession(format!(
                "Unable to slide the session: {}",
                result
            )));
        }

        self.last_slide_ts = Some(Utc::now());
        tracing::debug!(user = %self.user, "Legacy session slid");
        if let Some(store) = &self.autosave {
            self.export().save(store)?;
        }
        Ok(())
    }

    /// Close the account session and sign out.
    ///
    /// On failure the session stays usable and `stop` can be called again.
    /// Once it succeeds, calls through the session fail with
    /// [`Error::MissingSession`]; stopping again is a no-op.
    pub async fn stop(&mut self) -> Result<()> {
        if self.stopped {
            return Ok(());
        }
        let headers = self.headers()?;
        let closed = self
            .transport
            .call(CLOSE_SESSION_PATH, false, HttpMethod::Post, Some(json!({})), headers)
            .await?;
        let signed_out = Security::new(Arc::new(self.inner()?)).sign_out().await?;

        if !(is_truthy(&closed) && signed_out) {
            return Err(Error::LegacySession(format!(
                "Unable to close the session [account: {}, app: {}]",
                closed, signed_out
            )));
        }
        self.stopped = true;
        tracing::info!(user = %self.user, "Legacy session stopped");
        Ok(())
    }

    /// Snapshot the session so it can be resumed without the password.
    pub fn export(&self) -> SessionPack {
        SessionPack {
            public_ip: self.public_ip.clone(),
            user: self.user.clone(),
            user_key: self.user_key.clone(),
            signin_payload: self.signin.clone(),
            start_ts: to_epoch_seconds(self.start_ts),
            last_slide_ts: self.last_slide_ts.map(to_epoch_seconds),
        }
    }

    async fn start_account_session(&self) -> Result<()> {
        let body = json!({
            "name": self.signin.name,
            "user": self.signin.user,
            "sessionid": self.signin.hash,
            "hasLevel2": self.signin.has_level2,
            "isReadAndWrite": self.signin.is_read_and_write,
            "applicationid": APPLICATION_ID,
            "ipaddress": self.public_ip,
            "timeExpiresReadSession": self.signin.time_expires_read_session,
            "timeExpiresOperationSession": self.signin.time_expires_operation_session,
        });
        let result = self
            .transport
            .call(START_SESSION_PATH, false, HttpMethod::Post, Some(body), self.headers()?)
            .await?;
        if !is_truthy(&result) {
            return Err(Error::LegacySession(format!(
                "Unable to start the account session: {}",
                result
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for LegacySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LegacySession")
            .field("user", &self.user)
            .field("public_ip", &self.public_ip)
            .field("signin", &self.signin)
            .field("start_ts", &self.start_ts)
            .field("last_slide_ts", &self.last_slide_ts)
            .field("host", &self.transport.host)
            .field("stopped", &self.stopped)
            .finish()
    }
}

/// Everything needed to resume a legacy session without the password.
///
/// Stored as `last_session.json` in the preferences directory; there is one
/// such file regardless of user.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionPack {
    /// Public address the session is bound to
    pub public_ip: String,
    /// User the session was started for
    pub user: String,
    /// Hashed user key from `GetUserKey`
    pub user_key: String,
    /// Sign-in payload
    pub signin_payload: SigninPayload,
    /// Start time, epoch seconds
    pub start_ts: f64,
    /// Last slide time, epoch seconds
    pub last_slide_ts: Option<f64>,
}

impl SessionPack {
    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the pack as the last session, replacing any previous one.
    pub fn save(&self, store: &SessionStore) -> Result<PathBuf> {
        store.ensure_dir()?;
        let path = store.last_session_path();
        std::fs::write(&path, self.to_json()?)?;
        tracing::debug!(path = %path.display(), "Saved legacy session");
        Ok(path)
    }

    /// Read the last saved session.
    pub fn load_last(store: &SessionStore) -> Result<Self> {
        let path = store.last_session_path();
        let json = match std::fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::SessionFileNotFound(path));
            }
            Err(e) => return Err(e.into()),
        };
        Self::from_json(&json).map_err(|e| Error::SessionCorrupt {
            path,
            reason: e.to_string(),
        })
    }
}

impl std::fmt::Debug for SessionPack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionPack")
            .field("user", &self.user)
            .field("public_ip", &self.public_ip)
            .field("user_key", &"[REDACTED]")
            .field("signin_payload", &self.signin_payload)
            .field("start_ts", &self.start_ts)
            .field("last_slide_ts", &self.last_slide_ts)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> Value {
        json!({
            "alias": "alice@example.com",
            "hasLevel2": true,
            "hash": "h-123",
            "isReadAndWrite": false,
            "name": "Alice",
            "photo": null,
            "timeExpiresOperationSession": 20,
            "timeExpiresReadSession": 480,
            "user": 98765,
        })
    }

    fn pack(start: DateTime<Utc>) -> SessionPack {
        SessionPack {
            public_ip: "10.0.0.1".into(),
            user: "alice".into(),
            user_key: "key".into(),
            signin_payload: parse_signin(payload()).unwrap(),
            start_ts: to_epoch_seconds(start),
            last_slide_ts: None,
        }
    }

    fn session(start: DateTime<Utc>) -> LegacySession {
        LegacySession::from_pack_with_http_client(
            pack(start),
            reqwest::Client::new(),
            "https://www.gbmhomebroker.com/",
        )
        .unwrap()
    }

    #[test]
    fn test_parse_signin_numeric_user() {
        let signin = parse_signin(payload()).unwrap();
        assert_eq!(signin.user, "98765");
        assert_eq!(signin.hash, "h-123");
        assert_eq!(signin.time_expires_read_session, 480);
        assert!(signin.has_level2);
    }

    #[test]
    fn test_parse_signin_error_code() {
        let err = parse_signin(json!({
            "ErrorCode": 3003,
            "IsBussinessError": false,
            "ErrorMessage": "El usuario o la contraseña son incorrectos.",
            "EventId": 20810,
        }))
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Legacy session error: El usuario o la contraseña son incorrectos. <code: 3003>"
        );

        let err = parse_signin(json!({"ErrorCode": 1})).unwrap_err();
        assert!(err.to_string().contains("Unable to authenticate"));

        let err = parse_signin(json!({"foo": "bar"})).unwrap_err();
        assert!(err.to_string().contains("Unexpected payload"));
    }

    #[test]
    fn test_headers() {
        let session = session(Utc::now());
        let headers = session.headers().unwrap();
        assert_eq!(headers["x-forwarded-for"], "10.0.0.1");
        assert_eq!(headers["gbmdigitalidentityuser"], "98765");
        assert_eq!(headers["gbmdigitalidentityhash"], "h-123");
        assert_eq!(headers["gbmdigitalidentityapp"], "1");
    }

    #[test]
    fn test_remaining_uses_last_slide() {
        let mut session = session(Utc::now() - Duration::minutes(470));
        let now = session.start_time() + Duration::minutes(470);
        assert_eq!(session.remaining_at(now), Duration::minutes(10));

        session.last_slide_ts = Some(now);
        assert_eq!(session.remaining_at(now), Duration::minutes(480));
    }

    #[test]
    fn test_rejects_out_of_range_read_window() {
        let mut huge = payload();
        huge["timeExpiresReadSession"] = json!(i64::MAX);
        assert!(matches!(parse_signin(huge), Err(Error::LegacySession(_))));

        let mut pack = pack(Utc::now());
        pack.signin_payload.time_expires_read_session = i64::MAX;
        let err = LegacySession::from_pack_with_http_client(
            pack,
            reqwest::Client::new(),
            "https://www.gbmhomebroker.com/",
        )
        .unwrap_err();
        assert!(matches!(err, Error::LegacySession(_)));
    }

    #[test]
    fn test_remaining_saturates_past_the_calendar() {
        let mut session = session(Utc::now());
        session.read_window = Duration::MAX;
        assert_eq!(session.remaining(), Duration::MAX);
    }

    #[test]
    fn test_from_pack_rejects_expired() {
        let start = Utc::now() - Duration::minutes(481);
        let err = LegacySession::from_pack_with_http_client(
            pack(start),
            reqwest::Client::new(),
            "https://www.gbmhomebroker.com/",
        )
        .unwrap_err();
        assert!(matches!(err, Error::LegacySession(_)));
    }

    #[test]
    fn test_pack_layout() {
        let json: Value = serde_json::from_str(&pack(Utc::now()).to_json().unwrap()).unwrap();
        let obj = json.as_object().unwrap();
        let mut keys: Vec<_> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            ["last_slide_ts", "public_ip", "signin_payload", "start_ts", "user", "user_key"]
        );
        assert_eq!(json["signin_payload"]["user"], "98765");
        assert_eq!(json["signin_payload"]["timeExpiresReadSession"], 480);
    }

    #[test]
    fn test_export_round_trip_through_store() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SessionStore::new(tmp.path());
        let session = session(Utc::now()).with_autosave(store.clone()).unwrap();

        let loaded = SessionPack::load_last(&store).unwrap();
        assert_eq!(loaded, session.export());
    }

    #[test]
    fn test_load_last_missing_and_corrupt() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SessionStore::new(tmp.path());
        assert!(matches!(
            SessionPack::load_last(&store),
            Err(Error::SessionFileNotFound(_))
        ));

        std::fs::write(store.last_session_path(), "{not json").unwrap();
        assert!(matches!(
            SessionPack::load_last(&store),
            Err(Error::SessionCorrupt { .. })
        ));
    }

    #[test]
    fn test_debug_redacts_hash() {
        let debug_str = format!("{:?}", session(Utc::now()));
        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("h-123"));
    }
}
