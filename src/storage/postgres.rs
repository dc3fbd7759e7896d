//! PostgreSQL-backed ledger store.
//!
//! Uniqueness lives in the schema (`users.email`, `wallets(user_id, currency)`)
//! and wallet updates are conditional on the stored version, so several
//! processes may write the same database safely.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StorageError |
//! |------------|----------------------|--------------|
//! | Database (unique violation) on users | `23505` | `DuplicateEmail` |
//! | Database (unique violation) on wallets | `23505` | `WalletExists` |
//! | Anything else | - | `Database` |

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::aggregate::{User, Wallet};

use super::{LedgerStore, StorageError, StorageResult};

type WalletRow = (Uuid, Uuid, String, Decimal, i64);

/// PostgreSQL ledger store
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new PgStore with a database pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn wallet_from_row((id, user_id, currency, balance, version): WalletRow) -> StorageResult<Wallet> {
    Wallet::from_parts(id, user_id, currency, balance, version)
        .map_err(|e| StorageError::Corrupt(format!("wallet {}: {}", id, e)))
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == "23505";
        }
    }
    false
}

#[async_trait]
impl LedgerStore for PgStore {
    async fn user_exists(&self, id: Uuid) -> StorageResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    async fn get_user_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        let row: Option<(Uuid, String, DateTime<Utc>)> =
            sqlx::query_as("SELECT id, email, created_at FROM users WHERE email = $1")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(id, email, created_at)| User::from_parts(id, email, created_at)))
    }

    async fn add_user(&self, user: &User) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, created_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user.id())
        .bind(user.email())
        .bind(user.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StorageError::DuplicateEmail(user.email().to_string())
            } else {
                StorageError::Database(e)
            }
        })?;

        Ok(())
    }

    async fn get_wallet_by_id(&self, id: Uuid) -> StorageResult<Option<Wallet>> {
        let row: Option<WalletRow> = sqlx::query_as(
            "SELECT id, user_id, currency, balance, version FROM wallets WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(wallet_from_row).transpose()
    }

    async fn get_wallet(&self, user_id: Uuid, currency: &str) -> StorageResult<Option<Wallet>> {
        let row: Option<WalletRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, currency, balance, version
            FROM wallets
            WHERE user_id = $1 AND currency = $2
            "#,
        )
        .bind(user_id)
        .bind(currency)
        .fetch_optional(&self.pool)
        .await?;

        row.map(wallet_from_row).transpose()
    }

    async fn list_wallets(&self, user_id: Uuid) -> StorageResult<Vec<Wallet>> {
        let rows: Vec<WalletRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, currency, balance, version
            FROM wallets
            WHERE user_id = $1
            ORDER BY currency ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(wallet_from_row).collect()
    }

    async fn add_wallet(&self, wallet: &Wallet) -> StorageResult<Wallet> {
        sqlx::query(
            r#"
            INSERT INTO wallets (id, user_id, currency, balance, version)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(wallet.id())
        .bind(wallet.user_id())
        .bind(wallet.currency())
        .bind(wallet.balance())
        .bind(wallet.version())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StorageError::WalletExists {
                    user_id: wallet.user_id(),
                    currency: wallet.currency().to_string(),
                }
            } else {
                StorageError::Database(e)
            }
        })?;

        Ok(wallet.clone())
    }

    async fn update_wallet(&self, wallet: &Wallet, expected_version: i64) -> StorageResult<Wallet> {
        let row: Option<WalletRow> = sqlx::query_as(
            r#"
            UPDATE wallets
            SET balance = $2, version = version + 1
            WHERE id = $1 AND version = $3
            RETURNING id, user_id, currency, balance, version
            "#,
        )
        .bind(wallet.id())
        .bind(wallet.balance())
        .bind(expected_version)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return wallet_from_row(row);
        }

        // Nothing matched: either the version moved or the row is gone
        let found: Option<i64> = sqlx::query_scalar("SELECT version FROM wallets WHERE id = $1")
            .bind(wallet.id())
            .fetch_optional(&self.pool)
            .await?;

        match found {
            Some(found) => Err(StorageError::Conflict {
                wallet_id: wallet.id(),
                expected: expected_version,
                found,
            }),
            None => Err(StorageError::WalletNotFound(wallet.id())),
        }
    }
}
