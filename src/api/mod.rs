//! API service modules for the GBM REST endpoints.
//!
//! Each service wraps one API generation. Methods map one-to-one to an
//! upstream endpoint and return the parsed JSON body unmodified.

mod auth;
mod gbmp;
mod v1;
mod v2;

pub use auth::AuthService;
pub use gbmp::GbmpService;
pub use v1::V1Service;
pub use v2::V2Service;
