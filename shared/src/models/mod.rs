//! Domain models for the HR-IMS inventory platform

mod item;
mod notification;
mod request;
mod stock;
mod transfer;
mod warehouse;

pub use item::*;
pub use notification::*;
pub use request::*;
pub use stock::*;
pub use transfer::*;
pub use warehouse::*;
