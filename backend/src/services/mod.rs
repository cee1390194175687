//! Business logic services for the HR-IMS backend

pub mod ledger;
pub mod notification;
pub mod request;
pub mod retry;
pub mod transfer;

pub use ledger::LedgerService;
pub use notification::NotificationService;
pub use request::RequestService;
pub use transfer::TransferService;
