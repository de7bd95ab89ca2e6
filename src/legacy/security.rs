//! Security, user, utilities and research segments of the legacy API.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::models::HttpMethod;
use crate::{Error, Result};

use super::common::{base_headers, forwarded_headers, LegacyInner};

/// Sign-in, session sliding and sign-out.
pub struct Security {
    inner: Arc<LegacyInner>,
}

impl Security {
    const SEGMENT: &'static str = "Security";

    pub(crate) fn new(inner: Arc<LegacyInner>) -> Self {
        Self { inner }
    }

    /// Exchange a user name or email for the hashed user key `SignIn` wants.
    ///
    /// With a public address the call goes out with plain headers and needs
    /// no session.
    pub async fn user_key(&self, user: &str, public_ip: Option<&str>) -> Result<String> {
        let body = Some(json!({ "user": user }));
        let response = match public_ip {
            Some(ip) => {
                let headers = forwarded_headers(&self.inner.transport.host, ip)?;
                self.inner
                    .call_with_headers(Self::SEGMENT, "GetUserKey", HttpMethod::Post, body, headers)
                    .await?
            }
            None => {
                self.inner
                    .call(Self::SEGMENT, "GetUserKey", HttpMethod::Post, body)
                    .await?
            }
        };

        response
            .get("key")
            .and_then(Value::as_str)
            .map(String::from)
            .ok_or_else(|| Error::LegacySession(format!("GetUserKey returned no key: {}", response)))
    }

    /// Sign in with the user key and password.
    ///
    /// The payload is returned as-is; it carries either the identity hash
    /// or an `ErrorCode`/`ErrorMessage` pair.
    pub async fn sign_in(
        &self,
        user_key: &str,
        password: &str,
        public_ip: Option<&str>,
    ) -> Result<Value> {
        let body = Some(json!({
            "user": user_key,
            "password": password,
            "token": "",
            "deviceType": "1",
        }));
        match public_ip {
            Some(ip) => {
                let headers = forwarded_headers(&self.inner.transport.host, ip)?;
                self.inner
                    .call_with_headers(Self::SEGMENT, "SignIn/false", HttpMethod::Post, body, headers)
                    .await
            }
            None => {
                self.inner
                    .call(Self::SEGMENT, "SignIn/false", HttpMethod::Post, body)
                    .await
            }
        }
    }

    /// Extend the server-side session. Returns the `response` field.
    pub async fn slide_session(&self) -> Result<Value> {
        let response = self
            .inner
            .call(Self::SEGMENT, "SlideSession", HttpMethod::Post, Some(json!({})))
            .await?;
        Ok(response.get("response").cloned().unwrap_or(Value::Null))
    }

    /// Sign out. The API answers with an empty body; only a 200 counts.
    pub async fn sign_out(&self) -> Result<bool> {
        let status = self
            .inner
            .call_status(Self::SEGMENT, "SignOut", HttpMethod::Get)
            .await?;
        Ok(status == 200)
    }
}

/// The signed-in user's profile.
pub struct User {
    inner: Arc<LegacyInner>,
}

impl User {
    const SEGMENT: &'static str = "User";

    pub(crate) fn new(inner: Arc<LegacyInner>) -> Self {
        Self { inner }
    }

    /// Get the user's profile. `alias` is the user's email.
    pub async fn user(&self) -> Result<Value> {
        self.inner
            .call(Self::SEGMENT, "GetUser", HttpMethod::Get, None)
            .await
    }
}

/// Session-independent helpers.
pub struct Utilities {
    inner: Arc<LegacyInner>,
}

impl Utilities {
    const SEGMENT: &'static str = "Utilities";

    pub(crate) fn new(inner: Arc<LegacyInner>) -> Self {
        Self { inner }
    }

    /// The caller's public address as the legacy host sees it.
    pub async fn public_ip(&self) -> Result<String> {
        let headers = base_headers(&self.inner.transport.host)?;
        let response = self
            .inner
            .call_with_headers(Self::SEGMENT, "GetPublicIP", HttpMethod::Get, None, headers)
            .await?;
        response
            .get("response")
            .and_then(Value::as_str)
            .map(String::from)
            .ok_or_else(|| {
                Error::LegacySession(format!("GetPublicIP returned no address: {}", response))
            })
    }

    /// Server time in the Mexico City timezone.
    pub async fn central_hour(&self) -> Result<Value> {
        self.inner
            .call(Self::SEGMENT, "GetCentralHour", HttpMethod::Get, None)
            .await
    }
}

/// Research data entitlements.
pub struct Research {
    inner: Arc<LegacyInner>,
}

impl Research {
    const SEGMENT: &'static str = "Research";

    pub(crate) fn new(inner: Arc<LegacyInner>) -> Self {
        Self { inner }
    }

    /// Credentials for the interactive research data provider.
    pub async fn interactive_data_user(&self) -> Result<Value> {
        self.inner
            .call(Self::SEGMENT, "GetInteractiveDataUser", HttpMethod::Post, None)
            .await
    }
}
