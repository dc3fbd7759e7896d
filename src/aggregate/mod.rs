//! Aggregate module
//!
//! In-memory state for users and wallets.

pub mod user;
pub mod wallet;

pub use user::User;
pub use wallet::Wallet;
