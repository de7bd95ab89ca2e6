//! v2 REST service: accounts and market data.

use std::sync::Arc;

use serde_json::Value;

use crate::client::{quote, Api, ClientInner};
use crate::models::ContractId;
use crate::Result;

/// Service for the v2 REST API.
///
/// # Example
///
/// ```no_run
/// use gbm::ContractId;
///
/// # async fn example(client: gbm::GbmClient) -> gbm::Result<()> {
/// let contract = ContractId::new("123456");
/// let accounts = client.v2().accounts(&contract).await?;
///
/// let bars = client
///     .v2()
///     .intraday_trade_aggregates("BMV", "AMXL", "1m")
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct V2Service {
    inner: Arc<ClientInner>,
}

impl V2Service {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// List the accounts under a contract.
    pub async fn accounts(&self, contract_id: &ContractId) -> Result<Value> {
        self.inner
            .get(Api::V2, &format!("/contracts/{}/accounts", quote(contract_id.as_str())))
            .await
    }

    /// Whether the market is open.
    pub async fn opening_status(&self) -> Result<Value> {
        self.inner.get(Api::V2, "/opening-status").await
    }

    /// Intraday trade aggregates for a security.
    ///
    /// # Arguments
    ///
    /// * `exchange` - Market code, e.g. `"BMV"`
    /// * `security` - Security symbol
    /// * `timespan` - Aggregation window as the API names it
    pub async fn intraday_trade_aggregates(
        &self,
        exchange: &str,
        security: &str,
        timespan: &str,
    ) -> Result<Value> {
        let path = format!(
            "/markets/{}/securities/{}/intraday-trade-aggregates",
            quote(exchange),
            quote(security)
        );
        self.inner
            .get_with_query(Api::V2, &path, vec![("timespan", timespan.to_string())])
            .await
    }

    /// Intraday trades of an index.
    pub async fn index_intraday(&self, index: &str) -> Result<Value> {
        // "indexs" is the upstream spelling.
        let path = format!("/markets/indexs/securities/{}/intraday-trades", quote(index));
        self.inner.get(Api::V2, &path).await
    }
}
