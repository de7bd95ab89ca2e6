//! Contract, cash, operation and portfolio segments of the legacy API.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::models::{ContractId, HttpMethod};
use crate::Result;

use super::common::LegacyInner;

/// Timestamp layout the legacy web app sends, e.g. `2016-07-01T05:00:00.000Z`.
pub(crate) fn legacy_timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Bank accounts linked to a contract.
pub struct Cash {
    inner: Arc<LegacyInner>,
}

impl Cash {
    const SEGMENT: &'static str = "Cash";

    pub(crate) fn new(inner: Arc<LegacyInner>) -> Self {
        Self { inner }
    }

    /// Bank accounts registered for withdrawals and deposits.
    pub async fn all_bank_account_information(&self, contract_id: &ContractId) -> Result<Value> {
        let body = json!({
            "accountId": contract_id,
            "contractId": contract_id,
        });
        self.inner
            .call(Self::SEGMENT, "GetAllBankAccountInformation", HttpMethod::Post, Some(body))
            .await
    }

    /// Reference number for deposits into the contract.
    pub async fn deposit_account_information(&self, contract_id: &ContractId) -> Result<Value> {
        self.inner
            .call(
                Self::SEGMENT,
                "getDepositAccountInformation/undefined",
                HttpMethod::Post,
                Some(json!({ "contractId": contract_id })),
            )
            .await
    }
}

/// Contract lookup.
///
/// [`contracts_bp`](Self::contracts_bp) is the primary way to find the
/// contract id of an account.
pub struct ContractManagement {
    inner: Arc<LegacyInner>,
}

impl ContractManagement {
    const SEGMENT: &'static str = "ContractManagement";

    pub(crate) fn new(inner: Arc<LegacyInner>) -> Self {
        Self { inner }
    }

    /// Contracts visible to the user, with their ids.
    pub async fn contracts_bp(&self) -> Result<Value> {
        self.inner
            .call(Self::SEGMENT, "GetContractsBP", HttpMethod::Get, None)
            .await
    }

    /// Feature flags of a contract. Slow upstream; prefer
    /// [`contract`](Self::contract).
    pub async fn contracts(&self, contract_id: &ContractId) -> Result<Value> {
        self.inner
            .call(
                Self::SEGMENT,
                "GetContracts",
                HttpMethod::Post,
                Some(json!({ "request": contract_id })),
            )
            .await
    }

    /// Details of a single contract.
    pub async fn contract(&self, contract_id: &ContractId) -> Result<Value> {
        self.inner
            .call(
                Self::SEGMENT,
                "GetContract",
                HttpMethod::Post,
                Some(json!({ "contractId": contract_id })),
            )
            .await
    }
}

/// Trading-side account data.
pub struct Operation {
    inner: Arc<LegacyInner>,
}

impl Operation {
    const SEGMENT: &'static str = "Operation";

    pub(crate) fn new(inner: Arc<LegacyInner>) -> Self {
        Self { inner }
    }

    /// Current VAT rate applied to commissions.
    pub async fn iva(&self) -> Result<Value> {
        self.inner
            .call(Self::SEGMENT, "GetIVA", HttpMethod::Get, None)
            .await
    }

    /// Cash available to trade.
    pub async fn available_funds_for_trade(&self) -> Result<Value> {
        self.inner
            .call(Self::SEGMENT, "GetAvailableFundsForTrade/true", HttpMethod::Get, None)
            .await
    }

    /// Risk profile of the contract.
    pub async fn capital_market_contract_risk(&self, contract_id: &ContractId) -> Result<Value> {
        self.inner
            .call(
                Self::SEGMENT,
                "GetCapitalMarketContractRisk",
                HttpMethod::Post,
                Some(json!({ "contractId": contract_id })),
            )
            .await
    }

    /// Trading properties of the contract.
    pub async fn contract_properties(&self, contract_id: &ContractId) -> Result<Value> {
        self.inner
            .call(
                Self::SEGMENT,
                "GetContractProperties",
                HttpMethod::Post,
                Some(json!({ "contractId": contract_id })),
            )
            .await
    }

    /// Order blotter for the given instrument types.
    ///
    /// The web app sends `[-1]` or `[27, 28]` for funds and `[0, 2]` for
    /// equities.
    pub async fn blotter_capital_market(
        &self,
        instrument_types: &[i32],
        orders_id: Option<Value>,
        process_date: DateTime<Utc>,
        contract_id: &ContractId,
    ) -> Result<Value> {
        let body = json!({
            "instrumentTypes": instrument_types,
            "ordersId": orders_id,
            "processDate": legacy_timestamp(process_date),
            "contractId": contract_id,
        });
        self.inner
            .call(Self::SEGMENT, "GetBlotterCapitalMarket", HttpMethod::Post, Some(body))
            .await
    }
}

/// Optional parameters of [`Portfolio::transactions`].
///
/// Defaults match what the web app sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsQuery {
    /// Filter by settlement date instead of trade date
    pub is_settlement: bool,
    /// Zero-based page
    pub page_index: u32,
    /// Rows per page
    pub page_size: u32,
    /// Sort key; 23 is what the web app uses
    pub sort_transaction: i32,
    /// Ascending order
    pub ascendent: bool,
    /// Row to resume from
    pub row_number: Option<i64>,
}

impl Default for TransactionsQuery {
    fn default() -> Self {
        Self {
            is_settlement: false,
            page_index: 0,
            page_size: 10,
            sort_transaction: 23,
            ascendent: true,
            row_number: None,
        }
    }
}

impl TransactionsQuery {
    /// Set the page to fetch.
    pub fn page(mut self, index: u32, size: u32) -> Self {
        self.page_index = index;
        self.page_size = size;
        self
    }

    /// Filter by settlement date.
    pub fn settlement(mut self, is_settlement: bool) -> Self {
        self.is_settlement = is_settlement;
        self
    }

    /// Sort descending.
    pub fn descending(mut self) -> Self {
        self.ascendent = false;
        self
    }
}

/// Positions and account history.
pub struct Portfolio {
    inner: Arc<LegacyInner>,
}

impl Portfolio {
    const SEGMENT: &'static str = "Portfolio";

    pub(crate) fn new(inner: Arc<LegacyInner>) -> Self {
        Self { inner }
    }

    /// Transaction history between two dates.
    pub async fn transactions(
        &self,
        contract_id: &ContractId,
        process_date: DateTime<Utc>,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        query: TransactionsQuery,
    ) -> Result<Value> {
        let mut body = serde_json::to_value(&query)?;
        body["processDate"] = json!(legacy_timestamp(process_date));
        body["startDate"] = json!(legacy_timestamp(start_date));
        body["endDate"] = json!(legacy_timestamp(end_date));
        body["contractId"] = json!(contract_id);

        self.inner
            .call(Self::SEGMENT, "GetTransactions", HttpMethod::Post, Some(body))
            .await
    }

    /// Current positions.
    ///
    /// Each entry carries a `positionValueType`: 1 long, 5 investment funds,
    /// 8 collateral, 26 short, 27 cash, 1000 portfolio total.
    pub async fn position(&self, contract_id: &ContractId) -> Result<Value> {
        self.inner
            .call(
                Self::SEGMENT,
                "GetPosition",
                HttpMethod::Post,
                Some(json!({ "contractId": contract_id })),
            )
            .await
    }

    /// Traded amount between two dates; decides the commission tier.
    pub async fn capital_transactions_amount_by_range(
        &self,
        contract_id: &ContractId,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        global_contract: bool,
    ) -> Result<Value> {
        let body = json!({
            "contractId": contract_id,
            "startDate": legacy_timestamp(start_date),
            "endDate": legacy_timestamp(end_date),
            "globalContract": global_contract,
        });
        self.inner
            .call(
                Self::SEGMENT,
                "GetCapitalTransactionsAmountByRange",
                HttpMethod::Post,
                Some(body),
            )
            .await
    }
}
