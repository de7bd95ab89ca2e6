//! Market data segment of the legacy API.
//!
//! Instrument names such as `"AC *"` are percent-encoded before they
//! become part of a path.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::client::quote;
use crate::models::{HttpMethod, InstrumentType, IssueId};
use crate::Result;

use super::account::legacy_timestamp;
use super::common::LegacyInner;

/// Commodity type the web app asks for by default (indices).
pub const DEFAULT_COMMODITY_TYPE: i32 = -3;

/// Samples per intraday request the web app asks for.
pub const DEFAULT_INTRADAY_REQUEST: u32 = 60;

/// Quotes, charts, order books and watchlists.
pub struct Market {
    inner: Arc<LegacyInner>,
}

impl Market {
    const SEGMENT: &'static str = "Market";

    pub(crate) fn new(inner: Arc<LegacyInner>) -> Self {
        Self { inner }
    }

    async fn post(&self, fragment: &str, body: Value) -> Result<Value> {
        self.inner
            .call(Self::SEGMENT, fragment, HttpMethod::Post, Some(body))
            .await
    }

    async fn get(&self, fragment: &str) -> Result<Value> {
        self.inner
            .call(Self::SEGMENT, fragment, HttpMethod::Get, None)
            .await
    }

    /// Daily price history of an issue.
    pub async fn capital_market_historic_price(
        &self,
        issue_id: &IssueId,
        instrument_type: InstrumentType,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Result<Value> {
        self.post(
            "GetCapitalMarketHistoricPrice",
            json!({
                "issueId": issue_id,
                "instrumentType": instrument_type,
                "isOnline": true,
                "startDate": legacy_timestamp(start_date),
                "endDate": legacy_timestamp(end_date),
            }),
        )
        .await
    }

    /// Full intraday price series of an instrument.
    ///
    /// `request` is the number of samples; the web app sends
    /// [`DEFAULT_INTRADAY_REQUEST`].
    pub async fn instrument_prices_intraday_complete(
        &self,
        instrument: &IssueId,
        request: u32,
    ) -> Result<Value> {
        let fragment = format!(
            "GetInstrumentPricesIntradayComplete/{}",
            quote(instrument.as_str())
        );
        self.post(&fragment, json!({ "IsOnline": true, "request": request }))
            .await
    }

    /// Intraday weighted-average prices of an instrument.
    pub async fn instrument_prices_intraday_ppp(&self, instrument: &IssueId) -> Result<Value> {
        let fragment = format!("GetInstrumentPricesIntradayPPP/{}", quote(instrument.as_str()));
        self.post(&fragment, json!({ "IsOnLine": true })).await
    }

    /// The price monitor: every issue of a market with its last quote.
    pub async fn market_price_monitor_detail(
        &self,
        instrument_type: InstrumentType,
    ) -> Result<Value> {
        self.post(
            "GetMarketPriceMonitorDetail",
            json!({ "isOnLine": true, "instrumentType": instrument_type }),
        )
        .await
    }

    /// Intraday values of an index, e.g. `"IPC"`.
    pub async fn index_intraday(&self, index: &str) -> Result<Value> {
        let fragment = format!("GetIndexIntraday/{}", quote(index));
        self.post(&fragment, json!({ "IsOnline": true })).await
    }

    /// Commodities of one type.
    ///
    /// `None` lists the indices that have intraday charts.
    pub async fn commodities_by_type(&self, commodity_type: Option<i32>) -> Result<Value> {
        let body = match commodity_type {
            None => json!({ "isOnLine": true }),
            Some(commodity_type) => json!({ "commodityType": commodity_type }),
        };
        self.post("GetCommoditiesByType", body).await
    }

    /// Search issues by name.
    pub async fn search_issue(&self, query: &str) -> Result<Value> {
        self.get(&format!("SearchIssue/{}", quote(query))).await
    }

    /// The user's watchlists.
    pub async fn watchlist(&self) -> Result<Value> {
        self.get("GetWatchList").await
    }

    /// Quotes of the issues in one watchlist.
    pub async fn watch_list_detail(&self, watch_list_type: i64) -> Result<Value> {
        self.post(
            "GetWatchListDetail",
            json!({ "watchListType": watch_list_type, "isOnline": true }),
        )
        .await
    }

    /// Level 2 order book of an instrument.
    pub async fn l2_market_data(&self, instrument: &IssueId) -> Result<Value> {
        self.get(&format!("GetL2MarketData/{}", quote(instrument.as_str())))
            .await
    }

    /// Latest trades of an instrument.
    pub async fn md_market_data(&self, instrument: &IssueId) -> Result<Value> {
        self.get(&format!("GetMDMarketData/{}", quote(instrument.as_str())))
            .await
    }

    /// Share of the day's volume per brokerage house.
    pub async fn company_share_percentage(&self, instrument: &IssueId) -> Result<Value> {
        let fragment = format!("GetCompanySharePercentage/{}", quote(instrument.as_str()));
        self.inner
            .call(Self::SEGMENT, &fragment, HttpMethod::Post, None)
            .await
    }
}
