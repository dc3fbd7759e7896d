//! Per-wallet locks
//!
//! Deposits and withdrawals on the same (user, currency) pair run one at a
//! time; different pairs never wait on each other. Map entries are counted
//! and removed once the last holder or waiter is gone.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

/// Serialization key of one wallet
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WalletKey {
    pub user_id: Uuid,
    pub currency: String,
}

impl WalletKey {
    pub fn new(user_id: Uuid, currency: impl Into<String>) -> Self {
        Self {
            user_id,
            currency: currency.into(),
        }
    }
}

#[derive(Debug)]
struct Slot {
    mutex: Arc<AsyncMutex<()>>,
    /// Holders plus waiters
    users: usize,
}

/// Keyed async mutex
#[derive(Debug, Default)]
pub struct WalletLocks {
    slots: Mutex<HashMap<WalletKey, Slot>>,
}

impl WalletLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`.
    ///
    /// Dropping the returned future while it waits gives up the place in
    /// line without leaving anything behind.
    pub async fn acquire(self: &Arc<Self>, key: WalletKey) -> WalletGuard {
        let mutex = self.register(&key);
        let lease = Lease {
            locks: Arc::clone(self),
            key,
        };
        let permit = mutex.lock_owned().await;

        WalletGuard {
            _permit: permit,
            _lease: lease,
        }
    }

    /// Number of keys currently held or waited on
    pub fn len(&self) -> usize {
        self.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<WalletKey, Slot>> {
        // Poisoning is ignored: the map only holds counters
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn register(&self, key: &WalletKey) -> Arc<AsyncMutex<()>> {
        let mut slots = self.slots();
        let slot = slots.entry(key.clone()).or_insert_with(|| Slot {
            mutex: Arc::new(AsyncMutex::new(())),
            users: 0,
        });
        slot.users += 1;
        Arc::clone(&slot.mutex)
    }

    fn release(&self, key: &WalletKey) {
        let mut slots = self.slots();
        if let Some(slot) = slots.get_mut(key) {
            slot.users -= 1;
            if slot.users == 0 {
                slots.remove(key);
            }
        }
    }
}

/// Place in line for one key; released on drop
#[derive(Debug)]
struct Lease {
    locks: Arc<WalletLocks>,
    key: WalletKey,
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.locks.release(&self.key);
    }
}

/// Exclusive access to one wallet, released on drop
#[derive(Debug)]
pub struct WalletGuard {
    // Field order matters: unlock first, then give up the lease
    _permit: OwnedMutexGuard<()>,
    _lease: Lease,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_same_key_is_exclusive() {
        let locks = Arc::new(WalletLocks::new());
        let user_id = Uuid::new_v4();

        let guard = locks.acquire(WalletKey::new(user_id, "BTC")).await;

        let blocked = timeout(
            Duration::from_millis(50),
            locks.acquire(WalletKey::new(user_id, "BTC")),
        )
        .await;
        assert!(blocked.is_err());

        drop(guard);
        let reacquired = timeout(
            Duration::from_millis(50),
            locks.acquire(WalletKey::new(user_id, "BTC")),
        )
        .await;
        assert!(reacquired.is_ok());
    }

    #[tokio::test]
    async fn test_different_keys_do_not_wait() {
        let locks = Arc::new(WalletLocks::new());
        let user_id = Uuid::new_v4();

        let _btc = locks.acquire(WalletKey::new(user_id, "BTC")).await;
        let eth = timeout(
            Duration::from_millis(50),
            locks.acquire(WalletKey::new(user_id, "ETH")),
        )
        .await;
        let other_user = timeout(
            Duration::from_millis(50),
            locks.acquire(WalletKey::new(Uuid::new_v4(), "BTC")),
        )
        .await;

        assert!(eth.is_ok());
        assert!(other_user.is_ok());
    }

    #[tokio::test]
    async fn test_entries_removed_after_release() {
        let locks = Arc::new(WalletLocks::new());
        let key = WalletKey::new(Uuid::new_v4(), "BTC");

        let guard = locks.acquire(key.clone()).await;
        assert_eq!(locks.len(), 1);

        drop(guard);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_waiter_leaves_no_entry() {
        let locks = Arc::new(WalletLocks::new());
        let key = WalletKey::new(Uuid::new_v4(), "BTC");

        let guard = locks.acquire(key.clone()).await;
        let waited = timeout(Duration::from_millis(20), locks.acquire(key.clone())).await;
        assert!(waited.is_err());
        assert_eq!(locks.len(), 1);

        drop(guard);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_waiters_run_one_at_a_time() {
        let locks = Arc::new(WalletLocks::new());
        let key = WalletKey::new(Uuid::new_v4(), "BTC");
        let inside = Arc::new(std::sync::atomic::AtomicUsize::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let key = key.clone();
                let inside = Arc::clone(&inside);
                tokio::spawn(async move {
                    let _guard = locks.acquire(key).await;
                    let now = inside.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                    assert_eq!(now, 0);
                    tokio::time::sleep(Duration::from_millis(2)).await;
                    inside.fetch_sub(1, std::sync::atomic::Ordering::SeqCst);
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }
        assert!(locks.is_empty());
    }
}
