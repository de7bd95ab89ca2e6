//! Authentication and session management for the GBM REST APIs.
//!
//! Logging in is a two-step exchange: the credentials are answered with a
//! software-token MFA challenge, and the one-time code is answered with a
//! bearer token bundle. The bundle becomes a [`Session`], which can be
//! persisted per user and reloaded later without logging in again.
//!
//! ```no_run
//! use gbm::{AuthClient, ClientConfig, SessionStore};
//! use gbm::auth::StdinCodePrompt;
//!
//! # async fn example() -> gbm::Result<()> {
//! let auth = AuthClient::new(ClientConfig::default())?;
//! let session = auth
//!     .login("user@example.com", "password", &mut StdinCodePrompt)
//!     .await?;
//!
//! let store = SessionStore::from_env()?;
//! store.save(&session)?;
//!
//! // Later, in another process:
//! let session = store.load("user@example.com")?;
//! if session.expired() {
//!     println!("log in again");
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod session;
mod store;

pub use client::{AuthClient, Challenge, MfaCodeProvider, StdinCodePrompt, SOFTWARE_TOKEN_MFA};
pub use session::{Session, BEARER};
pub use store::{SessionStore, PREFERENCES_DIR_ENV};
pub(crate) use session::{from_epoch_seconds, to_epoch_seconds};
