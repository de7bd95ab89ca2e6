//! Data models for the GBM APIs.
//!
//! Response bodies are returned as `serde_json::Value` verbatim; the models
//! here cover what this crate sends rather than what it receives.
//!
//! - [`primitives`] - Identifier newtypes like `ContractId`
//! - [`enums`] - `InstrumentType` and the `HttpMethod` verbs

pub mod primitives;
pub mod enums;

pub use primitives::*;
pub use enums::*;
