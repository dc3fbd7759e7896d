//! Storage module
//!
//! Persistence port for users and wallets, with an in-memory adapter for
//! tests and single-process use and a PostgreSQL adapter for production.

mod error;
mod memory;
mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::aggregate::{User, Wallet};

pub use error::{StorageError, StorageResult};
pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Ledger storage abstraction
///
/// Every wallet write is conditional: `add_wallet` only succeeds when no
/// wallet exists for the (user, currency) pair, and `update_wallet` only
/// succeeds when the stored version still equals `expected_version`.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    // === Users ===

    /// Check whether a user with this ID is registered
    async fn user_exists(&self, id: Uuid) -> StorageResult<bool>;

    /// Look up a user by exact email
    async fn get_user_by_email(&self, email: &str) -> StorageResult<Option<User>>;

    /// Insert a new user. Fails with `DuplicateEmail` if the email is taken.
    async fn add_user(&self, user: &User) -> StorageResult<()>;

    // === Wallets ===

    /// Get wallet by ID
    async fn get_wallet_by_id(&self, id: Uuid) -> StorageResult<Option<Wallet>>;

    /// Get the wallet of a user in one currency
    async fn get_wallet(&self, user_id: Uuid, currency: &str) -> StorageResult<Option<Wallet>>;

    /// All wallets of a user, ordered by currency
    async fn list_wallets(&self, user_id: Uuid) -> StorageResult<Vec<Wallet>>;

    /// Insert a new wallet. Fails with `WalletExists` if the pair is taken.
    async fn add_wallet(&self, wallet: &Wallet) -> StorageResult<Wallet>;

    /// Compare-and-swap update: stores the wallet's balance with version
    /// `expected_version + 1`, or fails with `Conflict`.
    async fn update_wallet(&self, wallet: &Wallet, expected_version: i64) -> StorageResult<Wallet>;
}
