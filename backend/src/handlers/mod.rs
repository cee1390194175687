//! HTTP request handlers for the HR-IMS API

pub mod health;
pub mod notifications;
pub mod requests;
pub mod stock;
pub mod transfers;

pub use health::*;
pub use notifications::*;
pub use requests::*;
pub use stock::*;
pub use transfers::*;
