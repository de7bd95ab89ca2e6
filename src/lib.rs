//! # gbm-rs
//!
//! A Rust client for the GBM brokerage web APIs.
//!
//! The brokerage serves its web apps from several API generations. This
//! crate authenticates against them, keeps the resulting session on disk,
//! and exposes thin wrappers around their JSON endpoints.
//!
//! ## Features
//!
//! - **Authentication**: credential login answered by a software-token MFA
//!   challenge, yielding a bearer [`Session`]
//! - **Persistence**: per-user session files under a preferences directory
//! - **REST services**: the v1, v2 and GBMP generations plus the
//!   session-gated auth API
//! - **Legacy API**: the old digital API with its own session lifecycle
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gbm::{ClientConfig, ContractId, GbmClient};
//! use gbm::auth::StdinCodePrompt;
//!
//! #[tokio::main]
//! async fn main() -> gbm::Result<()> {
//!     let client = GbmClient::login(
//!         "user@example.com",
//!         "password",
//!         &mut StdinCodePrompt,
//!         ClientConfig::default(),
//!     )
//!     .await?;
//!     client.save_session()?;
//!
//!     let contracts = client.v1().contracts().await?;
//!     println!("{}", contracts);
//!
//!     let accounts = client.v2().accounts(&ContractId::new("123456")).await?;
//!     println!("{}", accounts);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Resuming a Saved Session
//!
//! ```rust,no_run
//! use gbm::{ClientConfig, GbmClient};
//!
//! #[tokio::main]
//! async fn main() -> gbm::Result<()> {
//!     let client = GbmClient::from_saved_session("user@example.com", ClientConfig::default())?;
//!
//!     if client.session().is_some_and(|s| s.expired()) {
//!         eprintln!("session expired, log in again");
//!         return Ok(());
//!     }
//!
//!     let status = client.v2().opening_status().await?;
//!     println!("{}", status);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod api;
pub mod auth;
pub mod client;
pub mod error;
pub mod legacy;
pub mod models;

// Re-export primary types at crate root for convenience
pub use auth::{AuthClient, Session, SessionStore};
pub use client::{Api, ClientConfig, Endpoints, GbmClient};
pub use error::{Error, Result};
pub use models::{ContractId, HttpMethod, InstrumentType, IssueId};

/// Prelude module for convenient imports.
///
/// ```rust
/// use gbm::prelude::*;
/// ```
pub mod prelude {
    pub use crate::auth::{AuthClient, Challenge, MfaCodeProvider, Session, SessionStore};
    pub use crate::client::{Api, ClientConfig, Endpoints, GbmClient};
    pub use crate::error::{Error, Result};
    pub use crate::legacy::{LegacyApi, LegacySession, SessionPack};
    pub use crate::models::{ContractId, HttpMethod, InstrumentType, IssueId};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_id_creation() {
        let contract = ContractId::new("123456");
        assert_eq!(contract.as_str(), "123456");
    }

    #[test]
    fn test_default_endpoints() {
        let endpoints = Endpoints::default();
        assert_eq!(endpoints.auth_v1, "https://auth.gbm.com/api/v1");
        assert_eq!(endpoints.legacy_host, "https://www.gbmhomebroker.com/");
    }

    #[test]
    fn test_instrument_type_values() {
        assert_eq!(InstrumentType::Bmv.value(), 0);
        assert_eq!(InstrumentType::Sic.value(), 2);
    }
}
