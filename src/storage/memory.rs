use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use uuid::Uuid;

use crate::aggregate::{User, Wallet};

use super::{LedgerStore, StorageError, StorageResult};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    users_by_email: HashMap<String, Uuid>,
    wallets: HashMap<Uuid, Wallet>,
    wallets_by_owner: HashMap<(Uuid, String), Uuid>,
}

/// In-memory ledger store.
///
/// Intended for tests/dev and single-process deployments without a database.
/// Enforces the same uniqueness and version rules as the PostgreSQL store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StorageError::Unavailable("lock poisoned".to_string()))
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StorageError::Unavailable("lock poisoned".to_string()))
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn user_exists(&self, id: Uuid) -> StorageResult<bool> {
        Ok(self.read()?.users.contains_key(&id))
    }

    async fn get_user_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        let tables = self.read()?;
        Ok(tables
            .users_by_email
            .get(email)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn add_user(&self, user: &User) -> StorageResult<()> {
        let mut tables = self.write()?;
        if tables.users_by_email.contains_key(user.email()) {
            return Err(StorageError::DuplicateEmail(user.email().to_string()));
        }
        tables
            .users_by_email
            .insert(user.email().to_string(), user.id());
        tables.users.insert(user.id(), user.clone());
        Ok(())
    }

    async fn get_wallet_by_id(&self, id: Uuid) -> StorageResult<Option<Wallet>> {
        Ok(self.read()?.wallets.get(&id).cloned())
    }

    async fn get_wallet(&self, user_id: Uuid, currency: &str) -> StorageResult<Option<Wallet>> {
        let tables = self.read()?;
        Ok(tables
            .wallets_by_owner
            .get(&(user_id, currency.to_string()))
            .and_then(|id| tables.wallets.get(id))
            .cloned())
    }

    async fn list_wallets(&self, user_id: Uuid) -> StorageResult<Vec<Wallet>> {
        let tables = self.read()?;
        let mut wallets: Vec<Wallet> = tables
            .wallets
            .values()
            .filter(|w| w.user_id() == user_id)
            .cloned()
            .collect();
        wallets.sort_by(|a, b| a.currency().cmp(b.currency()));
        Ok(wallets)
    }

    async fn add_wallet(&self, wallet: &Wallet) -> StorageResult<Wallet> {
        let mut tables = self.write()?;
        let key = (wallet.user_id(), wallet.currency().to_string());
        if tables.wallets_by_owner.contains_key(&key) {
            return Err(StorageError::WalletExists {
                user_id: wallet.user_id(),
                currency: wallet.currency().to_string(),
            });
        }
        tables.wallets_by_owner.insert(key, wallet.id());
        tables.wallets.insert(wallet.id(), wallet.clone());
        Ok(wallet.clone())
    }

    async fn update_wallet(&self, wallet: &Wallet, expected_version: i64) -> StorageResult<Wallet> {
        let mut tables = self.write()?;
        let stored = tables
            .wallets
            .get_mut(&wallet.id())
            .ok_or(StorageError::WalletNotFound(wallet.id()))?;

        if stored.version() != expected_version {
            return Err(StorageError::Conflict {
                wallet_id: wallet.id(),
                expected: expected_version,
                found: stored.version(),
            });
        }

        let updated = Wallet::from_parts(
            stored.id(),
            stored.user_id(),
            stored.currency().to_string(),
            wallet.balance(),
            expected_version + 1,
        )
        .map_err(|e| StorageError::Corrupt(e.to_string()))?;

        *stored = updated.clone();
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_add_and_find_user() {
        let store = MemoryStore::new();
        let user = User::register("alice@example.com");

        store.add_user(&user).await.unwrap();

        assert!(store.user_exists(user.id()).await.unwrap());
        assert!(!store.user_exists(Uuid::new_v4()).await.unwrap());
        assert_eq!(
            store.get_user_by_email("alice@example.com").await.unwrap(),
            Some(user)
        );
        // Emails are matched exactly
        assert!(store.get_user_by_email("ALICE@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryStore::new();
        store.add_user(&User::register("a@b.com")).await.unwrap();

        let result = store.add_user(&User::register("a@b.com")).await;

        assert!(matches!(result, Err(StorageError::DuplicateEmail(_))));
    }

    #[tokio::test]
    async fn test_one_wallet_per_currency() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        store.add_wallet(&Wallet::open(user_id, "BTC")).await.unwrap();

        let result = store.add_wallet(&Wallet::open(user_id, "BTC")).await;

        assert!(matches!(result, Err(StorageError::WalletExists { .. })));
        store.add_wallet(&Wallet::open(user_id, "ETH")).await.unwrap();
        assert_eq!(store.list_wallets(user_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_wallets_sorted_by_currency() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        for currency in ["USDT", "BTC", "ETH"] {
            store.add_wallet(&Wallet::open(user_id, currency)).await.unwrap();
        }
        store.add_wallet(&Wallet::open(Uuid::new_v4(), "BTC")).await.unwrap();

        let currencies: Vec<String> = store
            .list_wallets(user_id)
            .await
            .unwrap()
            .iter()
            .map(|w| w.currency().to_string())
            .collect();

        assert_eq!(currencies, vec!["BTC", "ETH", "USDT"]);
    }

    #[tokio::test]
    async fn test_update_wallet_compare_and_swap() {
        let store = MemoryStore::new();
        let mut wallet = Wallet::open(Uuid::new_v4(), "BTC");
        wallet.deposit(dec!(1)).unwrap();
        store.add_wallet(&wallet).await.unwrap();

        let mut first = store.get_wallet_by_id(wallet.id()).await.unwrap().unwrap();
        let mut second = first.clone();
        first.deposit(dec!(2)).unwrap();
        second.deposit(dec!(5)).unwrap();

        let stored = store.update_wallet(&first, 1).await.unwrap();
        assert_eq!(stored.version(), 2);
        assert_eq!(stored.balance(), dec!(3));

        // The second writer read version 1 too; its update must not overwrite
        let result = store.update_wallet(&second, 1).await;
        match result {
            Err(StorageError::Conflict { expected, found, .. }) => {
                assert_eq!(expected, 1);
                assert_eq!(found, 2);
            }
            other => panic!("Expected Conflict, got: {:?}", other),
        }

        let current = store.get_wallet(wallet.user_id(), "BTC").await.unwrap().unwrap();
        assert_eq!(current.balance(), dec!(3));
        assert_eq!(current.version(), 2);
    }

    #[tokio::test]
    async fn test_update_missing_wallet() {
        let store = MemoryStore::new();
        let wallet = Wallet::open(Uuid::new_v4(), "BTC");

        let result = store.update_wallet(&wallet, 0).await;

        assert!(matches!(result, Err(StorageError::WalletNotFound(_))));
    }
}
