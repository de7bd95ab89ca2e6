//! Application settings segment of the legacy API.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::models::HttpMethod;
use crate::Result;

use super::common::LegacyInner;

/// Dashboards, widgets, agreements and streaming topics.
///
/// Part of this segment is served under a lowercase path, as the web app
/// calls it.
pub struct AppManagement {
    inner: Arc<LegacyInner>,
}

impl AppManagement {
    const SEGMENT: &'static str = "AppManagement";
    const LOWER_SEGMENT: &'static str = "appmanagement";

    pub(crate) fn new(inner: Arc<LegacyInner>) -> Self {
        Self { inner }
    }

    async fn lower(&self, fragment: &str, method: HttpMethod, body: Option<Value>) -> Result<Value> {
        self.inner
            .call(Self::LOWER_SEGMENT, fragment, method, body)
            .await
    }

    async fn upper(&self, fragment: &str, method: HttpMethod, body: Option<Value>) -> Result<Value> {
        self.inner.call(Self::SEGMENT, fragment, method, body).await
    }

    /// Agreement types the user has to accept.
    pub async fn agreement_type(&self) -> Result<Value> {
        self.lower("GetAgreementType", HttpMethod::Get, None).await
    }

    /// Acceptance log of one agreement type.
    pub async fn agreement_log(&self, agreement_type_id: i64) -> Result<Value> {
        self.lower(
            "GetAgreementLog",
            HttpMethod::Post,
            Some(json!({ "agreementTypeId": agreement_type_id })),
        )
        .await
    }

    /// Commission tiers by traded amount.
    pub async fn commisions_badges(&self, global_contract: bool) -> Result<Value> {
        self.lower(
            "GetCommisionsBadges",
            HttpMethod::Post,
            Some(json!({ "GlobalContract": global_contract })),
        )
        .await
    }

    /// Widget types available to dashboards.
    pub async fn user_widget_types(&self) -> Result<Value> {
        self.lower("getUserWidgetTypes", HttpMethod::Get, None).await
    }

    /// The user's dashboards laid out for a screen size.
    pub async fn user_dashboards(&self, width: u32, height: u32) -> Result<Value> {
        self.lower(
            "getUserDashboards",
            HttpMethod::Post,
            Some(json!({ "width": width, "height": height })),
        )
        .await
    }

    /// Configuration of one widget.
    pub async fn widget_configuration(&self, widget_id: i64) -> Result<Value> {
        self.lower(
            &format!("getWidgetConfiguration/{}", widget_id),
            HttpMethod::Get,
            None,
        )
        .await
    }

    /// Widgets placed on one dashboard.
    pub async fn widgets_in_user_dashboard(&self, dashboard_id: i64) -> Result<Value> {
        self.lower(
            &format!("getWidgetsInUserDashBoard/{}", dashboard_id),
            HttpMethod::Get,
            None,
        )
        .await
    }

    /// Store widget configurations. `config` is the list of
    /// `{widgetId, configuration}` objects the web app sends; the API
    /// answers with an empty body.
    pub async fn update_widgets_configuration(&self, config: Value) -> Result<Value> {
        self.lower("updateWidgetsConfiguration", HttpMethod::Post, Some(config))
            .await
    }

    /// Default trading settings of the user.
    pub async fn user_default_configuration(&self) -> Result<Value> {
        self.upper("GetUserDefaultConfiguration", HttpMethod::Get, None)
            .await
    }

    /// Opening and closing times of the capital market.
    pub async fn capital_market_operation_time(&self) -> Result<Value> {
        self.upper("GetCapitalMarketOperationTime", HttpMethod::Get, None)
            .await
    }

    /// Supported cultures (locales).
    pub async fn cultures(&self) -> Result<Value> {
        self.upper("GetCultures", HttpMethod::Get, None).await
    }

    /// UI configuration of the web app for this user.
    pub async fn user_app_configuration(&self) -> Result<Value> {
        self.upper("GetUserAppConfiguration", HttpMethod::Get, None)
            .await
    }

    /// Real-time data topic for the given instruments (`["*"]` for all).
    pub async fn solace_data_topic(&self, is_sic: bool, instruments: &[&str]) -> Result<Value> {
        self.upper(
            "GetSolaceDataTopic",
            HttpMethod::Post,
            Some(json!({ "isRealTime": true, "issic": is_sic, "instruments": instruments })),
        )
        .await
    }

    /// Level 1 topic for the given instruments.
    pub async fn solace_topic(&self, is_sic: bool, instruments: &[&str]) -> Result<Value> {
        self.upper(
            "GetSolaceLTopic/true",
            HttpMethod::Post,
            Some(json!({ "isRealTime": true, "issic": is_sic, "instruments": instruments })),
        )
        .await
    }

    /// Topic carrying index updates.
    pub async fn solace_indexes_topic(&self) -> Result<Value> {
        self.upper("GetSolaceIndexesTopic", HttpMethod::Post, None)
            .await
    }
}
