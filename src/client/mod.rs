//! HTTP client and service layer for the GBM REST APIs.
//!
//! This module provides the main entry point [`GbmClient`].
//!
//! # Example
//!
//! ```no_run
//! use gbm::{ClientConfig, GbmClient};
//!
//! # async fn example() -> gbm::Result<()> {
//! let client = GbmClient::from_saved_session("user@example.com", ClientConfig::default())?;
//!
//! let status = client.v2().opening_status().await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod http;

pub use config::{Api, ClientConfig, Endpoints, APPLICATION_NAME, CLIENT_ID_ENV, DEFAULT_CLIENT_ID};
pub use http::GbmClient;
pub(crate) use http::{handle_response, quote, AuthMode, ClientInner, RequestOptions};
