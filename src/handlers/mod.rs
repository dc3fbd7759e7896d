//! Command Handlers module
//!
//! Handlers that validate a command, serialize access to the target wallet,
//! apply the change and persist it.

mod balance_handler;
mod commands;
mod deposit_handler;
mod ledger;
pub mod locks;
mod mutation;
mod user_handler;
mod withdraw_handler;


pub use balance_handler::BalanceHandler;
pub use commands::*;
pub use deposit_handler::DepositHandler;
pub use ledger::Ledger;
pub use user_handler::RegisterUserHandler;
pub use withdraw_handler::WithdrawHandler;
