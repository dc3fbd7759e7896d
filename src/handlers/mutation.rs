//! Wallet mutation engine
//!
//! Load-or-create, mutate, persist with compare-and-swap, audit. Shared by
//! the deposit and withdraw handlers.
//!
//! Nothing is written before the persist step, so a caller that goes away
//! earlier leaves no trace. The persist step runs in its own task holding
//! the wallet lock and finishes even if the caller is dropped.

use std::time::Duration;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::aggregate::Wallet;
use crate::audit::{AuditAction, AuditRecord};
use crate::config::ConcurrencyMode;
use crate::domain::{DomainError, OperationContext};
use crate::error::{AppError, AppResult};
use crate::storage::StorageError;
use crate::validation::{codes, ValidationErrors};

use super::ledger::Ledger;
use super::locks::{WalletGuard, WalletKey};

/// Change applied to one wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WalletMutation {
    Deposit(Decimal),
    Withdraw(Decimal),
}

impl WalletMutation {
    /// Only deposits open a missing wallet
    fn opens_wallet(self) -> bool {
        matches!(self, WalletMutation::Deposit(_))
    }

    fn apply(self, wallet: &mut Wallet) -> Result<Decimal, DomainError> {
        match self {
            WalletMutation::Deposit(amount) => wallet.deposit(amount),
            WalletMutation::Withdraw(amount) => wallet.withdraw(amount),
        }
    }

    fn action(self) -> AuditAction {
        match self {
            WalletMutation::Deposit(_) => AuditAction::FundsDeposited,
            WalletMutation::Withdraw(_) => AuditAction::FundsWithdrawn,
        }
    }
}

/// Outcome of a committed mutation
#[derive(Debug, Clone)]
pub(crate) struct Committed {
    /// Wallet as stored
    pub wallet: Wallet,
    /// Amount moved after truncation
    pub amount: Decimal,
}

/// Apply `mutation` to the (user, currency) wallet under the configured
/// concurrency mode
pub(crate) async fn commit(
    ledger: &Ledger,
    user_id: Uuid,
    currency: &str,
    mutation: WalletMutation,
    context: &OperationContext,
) -> AppResult<Committed> {
    match ledger.settings().concurrency {
        ConcurrencyMode::Lock => commit_locked(ledger, user_id, currency, mutation, context).await,
        ConcurrencyMode::Optimistic => {
            commit_optimistic(ledger, user_id, currency, mutation, context).await
        }
    }
}

// =========================================================================
// Lock mode
// =========================================================================

async fn commit_locked(
    ledger: &Ledger,
    user_id: Uuid,
    currency: &str,
    mutation: WalletMutation,
    context: &OperationContext,
) -> AppResult<Committed> {
    let guard = ledger
        .locks()
        .acquire(WalletKey::new(user_id, currency))
        .await;

    match try_commit(ledger, user_id, currency, mutation, context, Some(guard)).await {
        // Another writer got past the lock: not a retryable race here
        Err(AppError::Storage(e)) if e.is_conflict() => {
            tracing::error!(
                user_id = %user_id,
                currency = %currency,
                "Wallet changed while locked: {}",
                e
            );
            Err(concurrent_modification(user_id, currency))
        }
        other => other,
    }
}

// =========================================================================
// Optimistic mode
// =========================================================================

async fn commit_optimistic(
    ledger: &Ledger,
    user_id: Uuid,
    currency: &str,
    mutation: WalletMutation,
    context: &OperationContext,
) -> AppResult<Committed> {
    let max_attempts = ledger.settings().max_attempts.max(1);

    for attempt in 0..max_attempts {
        match try_commit(ledger, user_id, currency, mutation, context, None).await {
            Ok(committed) => return Ok(committed),
            Err(AppError::Storage(e)) if e.is_conflict() && attempt < max_attempts - 1 => {
                let delay = Duration::from_millis(10 * (attempt as u64 + 1));
                tracing::warn!(
                    user_id = %user_id,
                    currency = %currency,
                    "Wallet version conflict, retrying (attempt {}/{}): {}",
                    attempt + 1,
                    max_attempts,
                    e
                );
                tokio::time::sleep(delay).await;
            }
            Err(AppError::Storage(e)) if e.is_conflict() => {
                tracing::warn!(
                    user_id = %user_id,
                    currency = %currency,
                    "Wallet version conflict, giving up after {} attempts: {}",
                    max_attempts,
                    e
                );
                break;
            }
            Err(e) => return Err(e),
        }
    }

    Err(concurrent_modification(user_id, currency))
}

// =========================================================================
// Single attempt
// =========================================================================

async fn try_commit(
    ledger: &Ledger,
    user_id: Uuid,
    currency: &str,
    mutation: WalletMutation,
    context: &OperationContext,
    guard: Option<WalletGuard>,
) -> AppResult<Committed> {
    let (mut wallet, loaded_version) = match ledger.store().get_wallet(user_id, currency).await? {
        Some(wallet) => {
            let version = wallet.version();
            (wallet, Some(version))
        }
        None if mutation.opens_wallet() => (Wallet::open(user_id, currency), None),
        None => {
            return Err(AppError::Validation(ValidationErrors::single(
                "currency",
                codes::WALLET_NOT_FOUND,
                format!("Wallet in {} was not found.", currency),
            )))
        }
    };

    let amount = mutation.apply(&mut wallet)?;

    let ledger = ledger.clone();
    let context = context.clone();
    let persist = tokio::spawn(async move {
        let stored = match loaded_version {
            None => ledger.store().add_wallet(&wallet).await,
            Some(expected) => ledger.store().update_wallet(&wallet, expected).await,
        };
        drop(guard);
        let stored = stored?;

        let record = AuditRecord::builder(mutation.action(), stored.user_id())
            .wallet(&stored)
            .amount(amount)
            .build(&context);
        ledger.audit(record).await;

        Ok::<_, StorageError>(stored)
    });

    let stored = persist
        .await
        .map_err(|e| AppError::Internal(format!("Persist task failed: {}", e)))??;

    Ok(Committed {
        wallet: stored,
        amount,
    })
}

fn concurrent_modification(user_id: Uuid, currency: &str) -> AppError {
    AppError::Conflict(format!(
        "Wallet in {} for user {} was modified concurrently. Please retry.",
        currency, user_id
    ))
}
