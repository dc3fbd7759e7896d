//! Balance Query Handler
//!
//! Read-only. Never takes a wallet lock, so the answer may be stale by the
//! time the caller sees it.

use crate::aggregate::Wallet;
use crate::domain::OperationContext;
use crate::error::AppError;

use super::ledger::Ledger;
use super::{BalanceQuery, BalanceView, WalletBalance};

/// Handler for balance queries
pub struct BalanceHandler {
    ledger: Ledger,
}

impl BalanceHandler {
    pub fn new(ledger: Ledger) -> Self {
        Self { ledger }
    }

    /// With a currency: zero or one wallet. Without: every wallet of the
    /// user, ordered by currency.
    pub async fn execute(
        &self,
        query: BalanceQuery,
        context: &OperationContext,
    ) -> Result<BalanceView, AppError> {
        self.ledger.validator().balance(&query).await?;

        let store = self.ledger.store();
        let wallets: Vec<Wallet> = match &query.currency {
            Some(currency) => store
                .get_wallet(query.user_id, currency)
                .await?
                .into_iter()
                .collect(),
            None => store.list_wallets(query.user_id).await?,
        };

        tracing::debug!(
            user_id = %query.user_id,
            wallets = wallets.len(),
            correlation_id = ?context.correlation_id,
            "Balance queried"
        );

        Ok(BalanceView {
            user_id: query.user_id,
            wallets: wallets
                .into_iter()
                .map(|w| WalletBalance {
                    currency: w.currency().to_string(),
                    balance: w.balance(),
                })
                .collect(),
        })
    }
}
