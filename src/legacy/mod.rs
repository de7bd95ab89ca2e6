//! The legacy "old digital" API of the web home broker.
//!
//! This API predates the bearer-token REST family and uses its own
//! session: a sign-in hash sent in custom headers together with the
//! caller's public address. Start one with [`LegacySession::start`], then
//! reach the endpoint segments through [`LegacySession::api`].
//!
//! ```no_run
//! use gbm::legacy::LegacySession;
//! use gbm::{ClientConfig, InstrumentType};
//!
//! # async fn example() -> gbm::Result<()> {
//! let session = LegacySession::start("user@example.com", "secret", &ClientConfig::default()).await?;
//! let api = session.api()?;
//!
//! let contract = api.first_contract_id().await?;
//! let positions = api.portfolio().position(&contract).await?;
//! let monitor = api.market().market_price_monitor_detail(InstrumentType::Bmv).await?;
//! # Ok(())
//! # }
//! ```

mod account;
mod app_management;
mod common;
mod market;
mod security;
mod session;

use std::sync::Arc;

use serde_json::Value;

use crate::models::ContractId;
use crate::{Error, Result};

pub use account::{Cash, ContractManagement, Operation, Portfolio, TransactionsQuery};
pub use app_management::AppManagement;
pub use common::APPLICATION_ID;
pub use market::{Market, DEFAULT_COMMODITY_TYPE, DEFAULT_INTRADAY_REQUEST};
pub use security::{Research, Security, User, Utilities};
pub use session::{LegacySession, SessionPack, SigninPayload};

use common::{LegacyInner, LegacyTransport};

/// Entry point to the legacy endpoint segments.
#[derive(Clone)]
pub struct LegacyApi {
    inner: Arc<LegacyInner>,
}

impl LegacyApi {
    pub(crate) fn from_inner(inner: Arc<LegacyInner>) -> Self {
        Self { inner }
    }

    /// Endpoints without a session.
    ///
    /// Only calls that carry their own headers work, such as
    /// [`Utilities::public_ip`] and [`Security::user_key`] with an address.
    /// Everything else fails with [`Error::MissingSession`].
    pub fn unauthenticated(http: reqwest::Client, host: &str) -> Self {
        Self::from_inner(Arc::new(LegacyInner {
            transport: LegacyTransport::new(http, host),
            headers: None,
        }))
    }

    /// Dashboards, widgets and streaming topics.
    pub fn app_management(&self) -> AppManagement {
        AppManagement::new(self.inner.clone())
    }

    /// Bank accounts.
    pub fn cash(&self) -> Cash {
        Cash::new(self.inner.clone())
    }

    /// Contracts.
    pub fn contract_management(&self) -> ContractManagement {
        ContractManagement::new(self.inner.clone())
    }

    /// Market data.
    pub fn market(&self) -> Market {
        Market::new(self.inner.clone())
    }

    /// Trading-side account data.
    pub fn operation(&self) -> Operation {
        Operation::new(self.inner.clone())
    }

    /// Positions and history.
    pub fn portfolio(&self) -> Portfolio {
        Portfolio::new(self.inner.clone())
    }

    /// Research entitlements.
    pub fn research(&self) -> Research {
        Research::new(self.inner.clone())
    }

    /// Sign-in and session calls.
    pub fn security(&self) -> Security {
        Security::new(self.inner.clone())
    }

    /// User profile.
    pub fn user(&self) -> User {
        User::new(self.inner.clone())
    }

    /// Public address and server time.
    pub fn utilities(&self) -> Utilities {
        Utilities::new(self.inner.clone())
    }

    /// Contract id of the account's first contract.
    ///
    /// Individual accounts have exactly one contract. The lookup is not
    /// cached.
    pub async fn first_contract_id(&self) -> Result<ContractId> {
        let contracts = self.contract_management().contracts_bp().await?;
        first_contract(&contracts)
    }
}

impl std::fmt::Debug for LegacyApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LegacyApi")
            .field("host", &self.inner.transport.host)
            .field("authenticated", &self.inner.headers.is_some())
            .finish()
    }
}

fn first_contract(contracts: &Value) -> Result<ContractId> {
    let first = contracts
        .as_array()
        .and_then(|list| list.first())
        .ok_or_else(|| {
            Error::LegacySession("Unable to retrieve any contracts for the account".to_string())
        })?;
    match first.get("contractId") {
        Some(Value::String(id)) => Ok(ContractId::new(id.as_str())),
        Some(Value::Number(id)) => Ok(ContractId::new(id.to_string())),
        _ => Err(Error::LegacySession(format!(
            "Contract without an id: {}",
            first
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_contract() {
        let contracts = json!([{"contractId": 4512, "name": "A"}, {"contractId": 7}]);
        assert_eq!(first_contract(&contracts).unwrap().as_str(), "4512");

        let contracts = json!([{"contractId": "88"}]);
        assert_eq!(first_contract(&contracts).unwrap().as_str(), "88");

        assert!(first_contract(&json!([])).is_err());
        assert!(first_contract(&Value::Null).is_err());
        assert!(first_contract(&json!([{"name": "A"}])).is_err());
    }

    #[tokio::test]
    async fn test_unauthenticated_calls_fail_before_io() {
        let api = LegacyApi::unauthenticated(reqwest::Client::new(), "http://127.0.0.1:9/");
        let err = api.user().user().await.unwrap_err();
        assert!(matches!(err, Error::MissingSession));
    }
}
