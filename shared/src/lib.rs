//! Shared types and models for the HR-IMS inventory platform
//!
//! This crate contains the domain types shared between the backend and
//! other components of the system: the stock ledger model, the request and
//! transfer state machines, and the validation helpers they rely on.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
