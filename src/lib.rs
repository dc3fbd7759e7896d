//! custodial_wallet Library
//!
//! Re-exports modules for integration testing and external use.

pub mod aggregate;
pub mod api;
pub mod audit;
pub mod config;
pub mod db;
pub mod domain;
pub mod handlers;
pub mod storage;
pub mod validation;

mod error;

pub use config::{Config, LedgerSettings};
pub use domain::{Amount, AmountError, Balance, DomainError, OperationContext};
pub use error::{AppError, AppResult, ErrorResponse};
pub use handlers::Ledger;
