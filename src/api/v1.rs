//! v1 REST service.

use std::sync::Arc;

use serde_json::Value;

use crate::client::{Api, ClientInner};
use crate::Result;

/// Service for the v1 REST API.
///
/// # Example
///
/// ```no_run
/// # async fn example(client: gbm::GbmClient) -> gbm::Result<()> {
/// let contracts = client.v1().contracts().await?;
/// for contract in contracts.as_array().into_iter().flatten() {
///     println!("{}", contract);
/// }
/// # Ok(())
/// # }
/// ```
pub struct V1Service {
    inner: Arc<ClientInner>,
}

impl V1Service {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// List the contracts attached to the user.
    pub async fn contracts(&self) -> Result<Value> {
        self.inner.get(Api::V1, "/contracts").await
    }
}
