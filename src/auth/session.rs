//! Bearer credential bundle for the GBM REST APIs.

use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

/// The only token type the APIs issue.
pub const BEARER: &str = "Bearer";

/// Authentication session for the GBM REST APIs.
///
/// A session is the token bundle returned by the MFA challenge, stamped
/// with the moment it was issued. It is immutable: logging in again
/// produces a new session. Nothing evicts an expired session, so callers
/// check [`expired`](Self::expired) before use.
///
/// # Example
///
/// ```
/// use gbm::Session;
/// use serde_json::json;
///
/// let session = Session::new("user@example.com", &json!({
///     "accessToken": "a",
///     "identityToken": "i",
///     "refreshToken": "r",
///     "tokenType": "Bearer",
///     "expiresIn": 1200,
/// }))?;
///
/// assert_eq!(session.access_header(), "Bearer a");
/// assert!(!session.expired());
/// # Ok::<(), gbm::Error>(())
/// ```
pub struct Session {
    user: String,
    access_token: SecretString,
    identity_token: SecretString,
    refresh_token: SecretString,
    token_type: String,
    expires_in: i64,
    start_time: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    raw_response: Value,
}

impl Session {
    /// Build a session from a token response issued just now.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidTokenResponse`] if a token field is missing or an
    ///   unexpected field is present
    /// - [`Error::UnsupportedTokenType`] if the token type is not `Bearer`
    /// - [`Error::InvalidTokenResponse`] if `expiresIn` does not fit a
    ///   representable expiry time
    pub fn new(user: impl Into<String>, token_response: &Value) -> Result<Self> {
        Self::with_start_time(user, token_response, Utc::now())
    }

    /// Build a session from a token response issued at `start_time`.
    ///
    /// This is how persisted sessions are rebuilt: the clock keeps running
    /// from the original issuance, not from the reload. The start time is
    /// kept to microseconds, the precision of the session file.
    pub fn with_start_time(
        user: impl Into<String>,
        token_response: &Value,
        start_time: DateTime<Utc>,
    ) -> Result<Self> {
        let tokens: TokenResponse = serde_json::from_value(token_response.clone())
            .map_err(|e| Error::InvalidTokenResponse(e.to_string()))?;

        if tokens.token_type != BEARER {
            return Err(Error::UnsupportedTokenType(tokens.token_type));
        }

        let start_time = start_time.trunc_subsecs(6);
        let expires_at = Duration::try_seconds(tokens.expires_in)
            .and_then(|lifetime| start_time.checked_add_signed(lifetime))
            .ok_or_else(|| {
                Error::InvalidTokenResponse(format!(
                    "expiresIn {} is out of range",
                    tokens.expires_in
                ))
            })?;

        Ok(Self {
            user: user.into(),
            access_token: SecretString::from(tokens.access_token),
            identity_token: SecretString::from(tokens.identity_token),
            refresh_token: SecretString::from(tokens.refresh_token),
            token_type: tokens.token_type,
            expires_in: tokens.expires_in,
            start_time,
            expires_at,
            raw_response: token_response.clone(),
        })
    }

    /// The user this session was issued to.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Token type, always `Bearer`.
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// Lifetime of the access token in seconds.
    pub fn expires_in(&self) -> i64 {
        self.expires_in
    }

    /// When the token bundle was issued.
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// When the access token stops being valid.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// The token response exactly as the server returned it.
    pub fn raw_response(&self) -> &Value {
        &self.raw_response
    }

    /// `Authorization` value for data calls.
    pub fn access_header(&self) -> String {
        self.header_for(&self.access_token)
    }

    /// `Authorization` value for session teardown.
    pub fn refresh_header(&self) -> String {
        self.header_for(&self.refresh_token)
    }

    /// `Authorization` value carrying the identity token.
    pub fn identity_header(&self) -> String {
        self.header_for(&self.identity_token)
    }

    fn header_for(&self, token: &SecretString) -> String {
        format!("{} {}", self.token_type, token.expose_secret())
    }

    /// Check if the access token has expired.
    pub fn expired(&self) -> bool {
        self.expired_at(Utc::now())
    }

    /// Check if the access token is expired as of `now`.
    pub fn expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at()
    }

    /// Time left before expiry; negative once expired.
    pub fn remaining(&self) -> Duration {
        self.remaining_at(Utc::now())
    }

    /// Time left before expiry as of `now`.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Duration {
        self.expires_at.signed_duration_since(now)
    }

    /// Write the session to `path` as `{user, raw_response, start_time}`.
    ///
    /// The file handle is dropped on every path out of this function. A
    /// failed write can leave a truncated file behind; write to a temporary
    /// path and rename it when that matters.
    pub fn persist(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let record = SessionRecord {
            user: self.user.clone(),
            raw_response: self.raw_response.clone(),
            start_time: to_epoch_seconds(self.start_time),
        };

        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, &record)?;
        writer.flush()?;

        tracing::info!(user = %self.user, path = %path.display(), "Session persisted");
        Ok(())
    }

    /// Read a session written by [`persist`](Self::persist).
    ///
    /// # Errors
    ///
    /// - [`Error::SessionFileNotFound`] if nothing exists at `path`
    /// - [`Error::SessionCorrupt`] if the file cannot be parsed back into a
    ///   bearer session
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::SessionFileNotFound(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };

        let corrupt = |reason: String| Error::SessionCorrupt {
            path: path.to_path_buf(),
            reason,
        };

        let record: SessionRecord =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| corrupt(e.to_string()))?;
        let start_time = from_epoch_seconds(record.start_time)
            .ok_or_else(|| corrupt(format!("invalid start_time {}", record.start_time)))?;

        Self::with_start_time(record.user, &record.raw_response, start_time)
            .map_err(|e| corrupt(e.to_string()))
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("access_token", &"[REDACTED]")
            .field("identity_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at())
            .finish()
    }
}

/// The token bundle, exactly as issued by the challenge endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct TokenResponse {
    access_token: String,
    identity_token: String,
    refresh_token: String,
    token_type: String,
    expires_in: i64,
}

/// On-disk layout of a persisted session.
#[derive(Debug, Serialize, Deserialize)]
struct SessionRecord {
    user: String,
    raw_response: Value,
    start_time: f64,
}

pub(crate) fn to_epoch_seconds(t: DateTime<Utc>) -> f64 {
    t.timestamp_micros() as f64 / 1_000_000.0
}

pub(crate) fn from_epoch_seconds(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    DateTime::from_timestamp_micros((secs * 1_000_000.0).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn token_response(token_type: &str, expires_in: i64) -> Value {
        json!({
            "accessToken": "access-abc",
            "identityToken": "identity-def",
            "refreshToken": "refresh-ghi",
            "tokenType": token_type,
            "expiresIn": expires_in,
        })
    }

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_headers() {
        let session = Session::new("alice", &token_response("Bearer", 1200)).unwrap();
        assert_eq!(session.access_header(), "Bearer access-abc");
        assert_eq!(session.refresh_header(), "Bearer refresh-ghi");
        assert_eq!(session.identity_header(), "Bearer identity-def");
        assert_eq!(session.user(), "alice");
    }

    #[test]
    fn test_rejects_other_token_types() {
        let err = Session::new("alice", &token_response("MAC", 1200)).unwrap_err();
        match err {
            Error::UnsupportedTokenType(kind) => assert_eq!(kind, "MAC"),
            other => panic!("Expected UnsupportedTokenType, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_missing_and_extra_fields() {
        let mut missing = token_response("Bearer", 1200);
        missing.as_object_mut().unwrap().remove("identityToken");
        assert!(matches!(
            Session::new("alice", &missing),
            Err(Error::InvalidTokenResponse(_))
        ));

        let mut extra = token_response("Bearer", 1200);
        extra["scope"] = json!("trading");
        assert!(matches!(
            Session::new("alice", &extra),
            Err(Error::InvalidTokenResponse(_))
        ));
    }

    #[test]
    fn test_expiry_boundaries() {
        let session =
            Session::with_start_time("alice", &token_response("Bearer", 1200), at(1_000)).unwrap();

        assert!(!session.expired_at(at(1_000)));
        // Expiry is strict: the last second of the window is still valid.
        assert!(!session.expired_at(at(2_200)));
        assert!(session.expired_at(at(2_201)));

        assert_eq!(session.remaining_at(at(1_000)).num_seconds(), 1200);
        assert_eq!(session.remaining_at(at(2_500)).num_seconds(), -300);
    }

    #[test]
    fn test_fresh_session_not_expired() {
        let session = Session::new("alice", &token_response("Bearer", 1200)).unwrap();
        assert!(!session.expired());
        let remaining = session.remaining().num_seconds();
        assert!((1195..=1200).contains(&remaining), "remaining = {}", remaining);
    }

    #[test]
    fn test_persist_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alice_session.json");
        let start = DateTime::from_timestamp(1_700_000_000, 250_000_000).unwrap();
        let session =
            Session::with_start_time("alice", &token_response("Bearer", 1200), start).unwrap();

        session.persist(&path).unwrap();
        let loaded = Session::load(&path).unwrap();

        assert_eq!(loaded.user(), "alice");
        assert_eq!(loaded.start_time(), start);
        assert_eq!(loaded.access_header(), session.access_header());
        assert_eq!(loaded.refresh_header(), session.refresh_header());
        assert_eq!(loaded.identity_header(), session.identity_header());
        assert_eq!(loaded.raw_response(), session.raw_response());
    }

    #[test]
    fn test_fresh_session_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alice_session.json");
        let session = Session::new("alice", &token_response("Bearer", 1200)).unwrap();

        session.persist(&path).unwrap();
        let loaded = Session::load(&path).unwrap();

        assert_eq!(loaded.start_time(), session.start_time());
        assert_eq!(loaded.expires_at(), session.expires_at());
    }

    #[test]
    fn test_start_time_kept_to_microseconds() {
        let start = DateTime::from_timestamp(1_700_000_000, 123_456_789).unwrap();
        let session =
            Session::with_start_time("alice", &token_response("Bearer", 60), start).unwrap();
        assert_eq!(session.start_time().timestamp_subsec_nanos(), 123_456_000);
    }

    #[test]
    fn test_rejects_out_of_range_lifetime() {
        for expires_in in [i64::MAX, i64::MIN, i64::MAX / 1_000] {
            assert!(matches!(
                Session::new("alice", &token_response("Bearer", expires_in)),
                Err(Error::InvalidTokenResponse(_))
            ));
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.json");
        std::fs::write(
            &path,
            json!({
                "user": "alice",
                "raw_response": token_response("Bearer", i64::MAX),
                "start_time": 1_700_000_000.0,
            })
            .to_string(),
        )
        .unwrap();
        assert!(matches!(Session::load(&path), Err(Error::SessionCorrupt { .. })));
    }

    #[test]
    fn test_persisted_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.json");
        let session =
            Session::with_start_time("bob", &token_response("Bearer", 60), at(1_600_000_000))
                .unwrap();
        session.persist(&path).unwrap();

        let stored: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(stored["user"], "bob");
        assert_eq!(stored["start_time"].as_f64(), Some(1_600_000_000.0));
        assert_eq!(stored["raw_response"]["accessToken"], "access-abc");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nobody_session.json");
        assert!(matches!(Session::load(&path), Err(Error::SessionFileNotFound(p)) if p == path));
    }

    #[test]
    fn test_load_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Session::load(&path), Err(Error::SessionCorrupt { .. })));

        std::fs::write(
            &path,
            r#"{"user":"x","raw_response":{"tokenType":"Bearer"},"start_time":1.0}"#,
        )
        .unwrap();
        assert!(matches!(Session::load(&path), Err(Error::SessionCorrupt { .. })));
    }

    #[test]
    fn test_session_debug_redacts_tokens() {
        let session = Session::new("alice", &token_response("Bearer", 1200)).unwrap();
        let debug_str = format!("{:?}", session);

        assert!(!debug_str.contains("access-abc"));
        assert!(!debug_str.contains("refresh-ghi"));
        assert!(debug_str.contains("REDACTED"));
    }
}
