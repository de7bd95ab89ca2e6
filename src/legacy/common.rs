//! Transport and header plumbing shared by the legacy digital API.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, REFERER, USER_AGENT};
use serde_json::Value;
use url::Url;

use crate::client::handle_response;
use crate::models::HttpMethod;
use crate::{Error, Result};

/// Application id the legacy API expects in `GBMDigitalIdentityApp`.
pub const APPLICATION_ID: &str = "1";

/// Browser identity the legacy web app is served to.
const LEGACY_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; WOW64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/51.0.2704.103 Safari/537.36";

/// Page the legacy API expects requests to come from.
const DEFAULT_REFERER: &str = "HBPro/login";

/// Path of the JSON API under the legacy host.
const API_ROOT: &str = "GBMDigital/api/";

pub(crate) const X_FORWARDED_FOR: &str = "x-forwarded-for";
pub(crate) const IDENTITY_APP: &str = "gbmdigitalidentityapp";
pub(crate) const IDENTITY_USER: &str = "gbmdigitalidentityuser";
pub(crate) const IDENTITY_HASH: &str = "gbmdigitalidentityhash";

/// Headers every legacy request carries.
pub(crate) fn base_headers(host: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("es-MX"));
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/json;charset=UTF-8"),
    );
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/json, text/plain, */*"),
    );
    headers.insert(HeaderName::from_static("dnt"), HeaderValue::from_static("1"));
    headers.insert(
        HeaderName::from_static(IDENTITY_APP),
        HeaderValue::from_static(APPLICATION_ID),
    );
    headers.insert(USER_AGENT, HeaderValue::from_static(LEGACY_USER_AGENT));

    let referer = legacy_url(host, DEFAULT_REFERER, false)?;
    headers.insert(REFERER, header_value(referer.as_str())?);
    Ok(headers)
}

/// Base headers plus the caller's public address.
pub(crate) fn forwarded_headers(host: &str, public_ip: &str) -> Result<HeaderMap> {
    let mut headers = base_headers(host)?;
    headers.insert(HeaderName::from_static(X_FORWARDED_FOR), header_value(public_ip)?);
    Ok(headers)
}

pub(crate) fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| Error::InvalidInput(format!("Invalid header value {:?}", value)))
}

/// Resolve `path` against the legacy host, under the API root when
/// `is_api` is set.
pub(crate) fn legacy_url(host: &str, path: &str, is_api: bool) -> Result<Url> {
    let mut base = Url::parse(host)?;
    if is_api {
        base = base.join(API_ROOT)?;
    }
    Ok(base.join(path)?)
}

/// HTTP plumbing for the legacy host.
#[derive(Debug, Clone)]
pub(crate) struct LegacyTransport {
    pub(crate) http: reqwest::Client,
    pub(crate) host: String,
}

impl LegacyTransport {
    pub(crate) fn new(http: reqwest::Client, host: impl Into<String>) -> Self {
        Self {
            http,
            host: host.into(),
        }
    }

    pub(crate) async fn send(
        &self,
        path: &str,
        is_api: bool,
        method: HttpMethod,
        body: Option<Value>,
        headers: HeaderMap,
    ) -> Result<reqwest::Response> {
        if !matches!(method, HttpMethod::Get | HttpMethod::Post) {
            return Err(Error::InvalidInput(format!(
                "Unsupported method {:?} for the legacy API",
                method
            )));
        }
        let url = legacy_url(&self.host, path, is_api)?;
        tracing::debug!(?method, %url, "Sending legacy request");

        let mut request = self.http.request(method.as_reqwest(), url).headers(headers);
        if let Some(body) = &body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    pub(crate) async fn call(
        &self,
        path: &str,
        is_api: bool,
        method: HttpMethod,
        body: Option<Value>,
        headers: HeaderMap,
    ) -> Result<Value> {
        let response = self.send(path, is_api, method, body, headers).await?;
        handle_response(response, |status, body| Error::RemoteCallFailed { status, body }).await
    }
}

/// A legacy API endpoint set, bound to the session headers if there are any.
#[derive(Debug, Clone)]
pub(crate) struct LegacyInner {
    pub(crate) transport: LegacyTransport,
    pub(crate) headers: Option<HeaderMap>,
}

impl LegacyInner {
    fn session_headers(&self) -> Result<HeaderMap> {
        self.headers.clone().ok_or(Error::MissingSession)
    }

    /// Call `<segment>/<fragment>` with the session headers.
    pub(crate) async fn call(
        &self,
        segment: &str,
        fragment: &str,
        method: HttpMethod,
        body: Option<Value>,
    ) -> Result<Value> {
        let headers = self.session_headers()?;
        self.call_with_headers(segment, fragment, method, body, headers)
            .await
    }

    /// Call `<segment>/<fragment>` with explicit headers, session or not.
    pub(crate) async fn call_with_headers(
        &self,
        segment: &str,
        fragment: &str,
        method: HttpMethod,
        body: Option<Value>,
        headers: HeaderMap,
    ) -> Result<Value> {
        let path = format!("{}/{}", segment, fragment);
        self.transport.call(&path, true, method, body, headers).await
    }

    /// Call with the session headers and report only the HTTP status.
    pub(crate) async fn call_status(
        &self,
        segment: &str,
        fragment: &str,
        method: HttpMethod,
    ) -> Result<u16> {
        let headers = self.session_headers()?;
        let path = format!("{}/{}", segment, fragment);
        let response = self.transport.send(&path, true, method, None, headers).await?;
        Ok(response.status().as_u16())
    }
}

/// Loose truthiness of a JSON value, as the legacy API signals success.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_legacy_urls() {
        let host = "https://www.gbmhomebroker.com/";
        assert_eq!(
            legacy_url(host, "Security/GetUserKey", true).unwrap().as_str(),
            "https://www.gbmhomebroker.com/GBMDigital/api/Security/GetUserKey"
        );
        assert_eq!(
            legacy_url(host, "HBPro/loadPartial/Account/StartSession", false)
                .unwrap()
                .as_str(),
            "https://www.gbmhomebroker.com/HBPro/loadPartial/Account/StartSession"
        );
        assert_eq!(
            legacy_url(host, "Market/GetL2MarketData/AC%20%2A", true)
                .unwrap()
                .as_str(),
            "https://www.gbmhomebroker.com/GBMDigital/api/Market/GetL2MarketData/AC%20%2A"
        );
    }

    #[test]
    fn test_base_headers() {
        let headers = base_headers("https://www.gbmhomebroker.com/").unwrap();
        assert_eq!(headers[IDENTITY_APP], "1");
        assert_eq!(headers[ACCEPT_LANGUAGE], "es-MX");
        assert_eq!(headers[REFERER], "https://www.gbmhomebroker.com/HBPro/login");

        let forwarded = forwarded_headers("https://www.gbmhomebroker.com/", "10.0.0.1").unwrap();
        assert_eq!(forwarded[X_FORWARDED_FOR], "10.0.0.1");
    }

    #[test]
    fn test_truthiness() {
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!({"response": 1})));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&Value::Null));
        assert!(!is_truthy(&json!("")));
    }
}
