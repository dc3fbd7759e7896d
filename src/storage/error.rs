//! Storage Errors
//!
//! Error types for ledger store operations.

use uuid::Uuid;

/// Errors that can occur in a ledger store
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Email is already registered
    #[error("Email {0} is already registered")]
    DuplicateEmail(String),

    /// A wallet for this user and currency already exists
    #[error("Wallet for user {user_id} in {currency} already exists")]
    WalletExists { user_id: Uuid, currency: String },

    /// Optimistic concurrency conflict
    #[error("Version conflict for wallet {wallet_id}: expected version {expected}, found {found}")]
    Conflict {
        wallet_id: Uuid,
        expected: i64,
        found: i64,
    },

    /// Update targeted a wallet that is not stored
    #[error("Wallet not found: {0}")]
    WalletNotFound(Uuid),

    /// Stored data violates a domain invariant
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// Store is unusable (poisoned lock, closed pool, ...)
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StorageError {
    /// Check if another writer got there first
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            StorageError::Conflict { .. } | StorageError::WalletExists { .. }
        )
    }
}

/// Result alias for store operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflicts() {
        let conflict = StorageError::Conflict {
            wallet_id: Uuid::new_v4(),
            expected: 3,
            found: 4,
        };
        assert!(conflict.is_conflict());
        assert!(conflict.to_string().contains("expected version 3, found 4"));

        let exists = StorageError::WalletExists {
            user_id: Uuid::new_v4(),
            currency: "BTC".to_string(),
        };
        assert!(exists.is_conflict());

        assert!(!StorageError::DuplicateEmail("a@b.com".to_string()).is_conflict());
        assert!(!StorageError::Unavailable("lock poisoned".to_string()).is_conflict());
    }
}
