//! Login handshake and session teardown against the auth API.

use std::future::Future;

use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::auth::Session;
use crate::client::{handle_response, Api, AuthMode, ClientConfig, ClientInner, RequestOptions};
use crate::models::HttpMethod;
use crate::{Error, Result};

/// The only MFA challenge this client can answer.
pub const SOFTWARE_TOKEN_MFA: &str = "SOFTWARE_TOKEN_MFA";

/// The challenge the auth service issues after the password step.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    /// Kind of challenge, e.g. `SOFTWARE_TOKEN_MFA`
    pub challenge_type: String,
    /// Opaque handle that ties the answer to this login attempt
    #[serde(default)]
    pub session: Option<String>,
}

/// Source of one-time codes for the MFA step.
///
/// Closures work directly:
///
/// ```
/// use gbm::auth::{Challenge, MfaCodeProvider};
///
/// # async fn example() -> gbm::Result<()> {
/// let mut codes = |_: &Challenge| Ok::<_, gbm::Error>("123456".to_string());
/// # let challenge = Challenge { challenge_type: "SOFTWARE_TOKEN_MFA".into(), session: None };
/// assert_eq!(codes.code(&challenge).await?, "123456");
/// # Ok(())
/// # }
/// ```
pub trait MfaCodeProvider {
    /// Produce the one-time code answering `challenge`.
    fn code(&mut self, challenge: &Challenge) -> impl Future<Output = Result<String>> + Send;
}

impl<F> MfaCodeProvider for F
where
    F: FnMut(&Challenge) -> Result<String>,
{
    fn code(&mut self, challenge: &Challenge) -> impl Future<Output = Result<String>> + Send {
        std::future::ready(self(challenge))
    }
}

/// Asks for the one-time code on the terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinCodePrompt;

impl MfaCodeProvider for StdinCodePrompt {
    fn code(&mut self, _challenge: &Challenge) -> impl Future<Output = Result<String>> + Send {
        prompt_code()
    }
}

async fn prompt_code() -> Result<String> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(b"Token: ").await?;
    stdout.flush().await?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await?;
    let code = line.trim().to_string();
    if code.is_empty() {
        return Err(Error::InvalidInput("Empty MFA code".to_string()));
    }
    Ok(code)
}

/// Client for the login and logout exchanges.
///
/// # Example
///
/// ```no_run
/// use gbm::{AuthClient, ClientConfig};
///
/// # async fn example() -> gbm::Result<()> {
/// let auth = AuthClient::new(ClientConfig::default())?;
/// let mut codes = |_: &gbm::auth::Challenge| Ok::<_, gbm::Error>("123456".to_string());
/// let session = auth.login("user@example.com", "secret", &mut codes).await?;
/// println!("valid for {}s", session.remaining().num_seconds());
///
/// auth.logout(&session).await?;
/// # Ok(())
/// # }
/// ```
pub struct AuthClient {
    inner: ClientInner,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialResponse {
    challenge_info: Option<Challenge>,
}

impl AuthClient {
    /// Create an auth client with its own transport.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = config.build_http()?;
        Ok(Self::with_http_client(http, config))
    }

    /// Create an auth client on a caller-supplied transport.
    pub fn with_http_client(http: reqwest::Client, config: ClientConfig) -> Self {
        Self {
            inner: ClientInner {
                http,
                session: None,
                config,
            },
        }
    }

    /// Submit the user's credentials. The response carries the MFA
    /// challenge.
    pub async fn session_user(&self, user: &str, password: &str) -> Result<Value> {
        let body = json!({
            "clientId": self.inner.config.client_id,
            "user": user,
            "password": password,
        });
        self.call(
            HttpMethod::Post,
            "/session/user",
            RequestOptions::default().body(body).auth(AuthMode::Optional),
        )
        .await
    }

    /// Answer a software-token challenge. The response is the token bundle.
    pub async fn session_user_challenge(
        &self,
        user: &str,
        challenge_session: &str,
        code: &str,
    ) -> Result<Value> {
        let body = json!({
            "challengeType": SOFTWARE_TOKEN_MFA,
            "session": challenge_session,
            "user": user,
            "code": code,
            "clientId": self.inner.config.client_id,
            "applicationName": self.inner.config.application_name,
        });
        self.call(
            HttpMethod::Post,
            "/session/user/challenge",
            RequestOptions::default().body(body).auth(AuthMode::Optional),
        )
        .await
    }

    /// Delete the server-side session identified by a refresh header.
    pub async fn delete_session_user(&self, refresh_header: &str) -> Result<Value> {
        let options = RequestOptions::default()
            .query("client_id", &self.inner.config.client_id)
            .auth(AuthMode::Header(refresh_header.to_string()));
        self.call(HttpMethod::Delete, "/session/user", options).await
    }

    /// Run the full login handshake: credentials, challenge, one-time code.
    ///
    /// # Errors
    ///
    /// - [`Error::AuthRequestFailed`] if either exchange returns a
    ///   non-success status
    /// - [`Error::UnsupportedChallenge`] if the challenge is not
    ///   `SOFTWARE_TOKEN_MFA`
    /// - [`Error::UnsupportedTokenType`] if the issued bundle is not a bearer
    ///   bundle
    pub async fn login<P: MfaCodeProvider>(
        &self,
        user: &str,
        password: &str,
        codes: &mut P,
    ) -> Result<Session> {
        tracing::info!(user, "Logging in");

        let response = self.session_user(user, password).await?;
        let credentials: CredentialResponse = serde_json::from_value(response)?;
        let challenge = credentials
            .challenge_info
            .ok_or_else(|| Error::UnsupportedChallenge("no challenge issued".to_string()))?;

        if challenge.challenge_type != SOFTWARE_TOKEN_MFA {
            return Err(Error::UnsupportedChallenge(challenge.challenge_type));
        }
        let challenge_session = challenge.session.clone().ok_or_else(|| {
            Error::UnsupportedChallenge(format!("{} without a session", SOFTWARE_TOKEN_MFA))
        })?;

        let code = codes.code(&challenge).await?;
        let tokens = self
            .session_user_challenge(user, &challenge_session, &code)
            .await?;

        let session = Session::new(user, &tokens)?;
        tracing::info!(user, expires_at = %session.expires_at(), "Login completed");
        Ok(session)
    }

    /// Log in, prompting for the password and the one-time code on the
    /// terminal.
    pub async fn login_interactive(&self, user: &str) -> Result<Session> {
        let password =
            tokio::task::spawn_blocking(|| rpassword::prompt_password("GBM Password: "))
                .await
                .map_err(std::io::Error::other)??;
        self.login(user, &password, &mut StdinCodePrompt).await
    }

    /// Tear down the server-side session. Success is judged by HTTP status
    /// alone.
    pub async fn logout(&self, session: &Session) -> Result<()> {
        self.delete_session_user(&session.refresh_header()).await?;
        tracing::info!(user = session.user(), "Logged out");
        Ok(())
    }

    async fn call(
        &self,
        method: HttpMethod,
        path: &str,
        options: RequestOptions<'_>,
    ) -> Result<Value> {
        let response = self.inner.send(Api::AuthV1, method, path, options).await?;
        handle_response(response, |status, body| Error::AuthRequestFailed { status, body }).await
    }
}

impl std::fmt::Debug for AuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthClient")
            .field("config", &self.inner.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_challenge_parses() {
        let response: CredentialResponse = serde_json::from_value(json!({
            "challengeInfo": {"challengeType": "SOFTWARE_TOKEN_MFA", "session": "s-1"}
        }))
        .unwrap();
        let challenge = response.challenge_info.unwrap();
        assert_eq!(challenge.challenge_type, SOFTWARE_TOKEN_MFA);
        assert_eq!(challenge.session.as_deref(), Some("s-1"));
    }

    #[tokio::test]
    async fn test_closure_provider() {
        let mut calls = 0;
        let mut provider = |challenge: &Challenge| {
            calls += 1;
            Ok::<_, Error>(format!("code-for-{}", challenge.challenge_type))
        };
        let challenge = Challenge {
            challenge_type: "SOFTWARE_TOKEN_MFA".into(),
            session: Some("s".into()),
        };
        assert_eq!(
            provider.code(&challenge).await.unwrap(),
            "code-for-SOFTWARE_TOKEN_MFA"
        );
        drop(provider);
        assert_eq!(calls, 1);
    }
}
