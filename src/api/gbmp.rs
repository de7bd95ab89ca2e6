//! GBMP REST service.

use std::sync::Arc;

use serde_json::Value;

use crate::client::{Api, ClientInner, RequestOptions};
use crate::models::HttpMethod;
use crate::Result;

/// Service for the GBMP API, which backs the trading-pro web app.
///
/// The GBMP surface has no fixed catalog here: calls go straight to a path
/// under the GBMP base with the session attached.
///
/// # Example
///
/// ```no_run
/// use serde_json::json;
///
/// # async fn example(client: gbm::GbmClient) -> gbm::Result<()> {
/// let gbmp = client.gbmp();
/// let quotes = gbmp.post("/quotes", json!({"symbols": ["AMXL"]})).await?;
/// # Ok(())
/// # }
/// ```
pub struct GbmpService {
    inner: Arc<ClientInner>,
}

impl GbmpService {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// GET a path under the GBMP base.
    pub async fn get(&self, path: &str) -> Result<Value> {
        self.inner.get(Api::Gbmp, path).await
    }

    /// GET a path with query parameters.
    pub async fn get_with_query(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        let query = query.iter().map(|(k, v)| (*k, v.to_string())).collect();
        self.inner.get_with_query(Api::Gbmp, path, query).await
    }

    /// POST a JSON body to a path.
    pub async fn post(&self, path: &str, body: Value) -> Result<Value> {
        self.inner.post(Api::Gbmp, path, body).await
    }

    /// DELETE a path.
    pub async fn delete(&self, path: &str) -> Result<Value> {
        self.inner.delete(Api::Gbmp, path).await
    }

    /// OPTIONS on a path.
    pub async fn options(&self, path: &str) -> Result<Value> {
        self.inner.options(Api::Gbmp, path).await
    }

    /// Issue any supported verb with an optional body.
    pub async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value> {
        let options = RequestOptions {
            body,
            ..Default::default()
        };
        self.inner.request(Api::Gbmp, method, path, options).await
    }
}
