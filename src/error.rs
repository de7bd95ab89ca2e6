//! Error types for the GBM API client.
//!
//! Every failure is terminal for the call that produced it: nothing is
//! retried internally and nothing is downgraded to a warning.

use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

/// A specialized `Result` type for GBM operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for all GBM API operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The login or logout exchange returned a non-success status.
    #[error("Authentication request failed: status={status}, body={body}")]
    AuthRequestFailed {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// The server asked for an MFA challenge this client cannot answer.
    #[error("Unsupported authentication challenge: {0}")]
    UnsupportedChallenge(String),

    /// The token bundle is not a bearer bundle.
    #[error("Unsupported token type: {0}")]
    UnsupportedTokenType(String),

    /// The token bundle is missing fields or carries unexpected ones.
    #[error("Invalid token response: {0}")]
    InvalidTokenResponse(String),

    /// A data endpoint returned a non-success status.
    #[error("Remote call failed: status={status}, body={body}")]
    RemoteCallFailed {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// No saved session exists at the given path.
    #[error("Session file not found: {}", .0.display())]
    SessionFileNotFound(PathBuf),

    /// The saved session exists but cannot be parsed.
    #[error("Session file {} is corrupt: {reason}", path.display())]
    SessionCorrupt {
        /// Path of the session file
        path: PathBuf,
        /// What went wrong while parsing it
        reason: String,
    },

    /// A session-gated endpoint was called without a session.
    #[error("Unable to use this endpoint without a session")]
    MissingSession,

    /// The legacy digital API refused or could not complete a session step.
    #[error("Legacy session error: {0}")]
    LegacySession(String),

    /// HTTP transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem failure while persisting or loading a session
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// URL parsing error
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Invalid input provided to a function
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Returns `true` if this is an authentication-related error.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            Error::AuthRequestFailed { .. }
                | Error::UnsupportedChallenge(_)
                | Error::UnsupportedTokenType(_)
                | Error::InvalidTokenResponse(_)
                | Error::MissingSession
                | Error::LegacySession(_)
        ) || self.status() == Some(401)
    }

    /// Returns the HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::AuthRequestFailed { status, .. } | Error::RemoteCallFailed { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Returns `true` if this error indicates a client-side issue
    /// (invalid input, bad request, etc.).
    pub fn is_client_error(&self) -> bool {
        match self.status() {
            Some(status) => (400..500).contains(&status),
            None => matches!(self, Error::InvalidInput(_) | Error::Config(_)),
        }
    }

    /// Returns `true` if this error indicates a server-side issue.
    pub fn is_server_error(&self) -> bool {
        self.status().is_some_and(|status| status >= 500)
    }

    /// The response body parsed as JSON, when the error carries one.
    pub fn body_json(&self) -> Option<Value> {
        match self {
            Error::AuthRequestFailed { body, .. } | Error::RemoteCallFailed { body, .. } => {
                serde_json::from_str(body).ok()
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_auth() {
        assert!(Error::MissingSession.is_auth_error());
        assert!(Error::UnsupportedChallenge("SMS_MFA".into()).is_auth_error());
        assert!(Error::RemoteCallFailed {
            status: 401,
            body: String::new()
        }
        .is_auth_error());
        assert!(!Error::InvalidInput("bad".into()).is_auth_error());
    }

    #[test]
    fn test_status_classes() {
        let not_found = Error::RemoteCallFailed {
            status: 404,
            body: "missing".into(),
        };
        assert!(not_found.is_client_error());
        assert!(!not_found.is_server_error());

        let boom = Error::AuthRequestFailed {
            status: 503,
            body: String::new(),
        };
        assert!(boom.is_server_error());
        assert_eq!(boom.status(), Some(503));
        assert_eq!(Error::MissingSession.status(), None);
    }

    #[test]
    fn test_body_json() {
        let err = Error::RemoteCallFailed {
            status: 400,
            body: r#"{"message":"bad contract"}"#.into(),
        };
        let body = err.body_json().unwrap();
        assert_eq!(body["message"], "bad contract");

        let plain = Error::RemoteCallFailed {
            status: 500,
            body: "Internal Server Error".into(),
        };
        assert!(plain.body_json().is_none());
    }
}
