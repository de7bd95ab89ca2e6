//! Session-gated endpoints of the auth API.

use std::sync::Arc;

use serde_json::Value;

use crate::client::{Api, ClientInner};
use crate::Result;

/// Service for the auth API calls that need a session.
///
/// Login and logout live on [`AuthClient`](crate::AuthClient); this service
/// only covers introspection of an existing session.
pub struct AuthService {
    inner: Arc<ClientInner>,
}

impl AuthService {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// Describe the token the session is using.
    pub async fn token(&self) -> Result<Value> {
        self.inner.get(Api::AuthV1, "/token").await
    }

    /// Get the user's security settings.
    pub async fn security_settings(&self) -> Result<Value> {
        self.inner.get(Api::AuthV1, "/security-settings").await
    }
}
