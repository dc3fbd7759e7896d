//! Deposit Handler
//!
//! Credits a wallet, opening it on the first deposit in a currency.

use crate::domain::OperationContext;
use crate::error::AppError;

use super::ledger::Ledger;
use super::mutation::{self, WalletMutation};
use super::{DepositCommand, DepositResult};

/// Handler for deposits
pub struct DepositHandler {
    ledger: Ledger,
}

impl DepositHandler {
    pub fn new(ledger: Ledger) -> Self {
        Self { ledger }
    }

    /// Execute the deposit command
    pub async fn execute(
        &self,
        command: DepositCommand,
        context: &OperationContext,
    ) -> Result<DepositResult, AppError> {
        self.ledger.validator().deposit(&command).await?;

        let committed = mutation::commit(
            &self.ledger,
            command.user_id,
            &command.currency,
            WalletMutation::Deposit(command.amount),
            context,
        )
        .await?;

        tracing::info!(
            user_id = %command.user_id,
            currency = %command.currency,
            amount = %committed.amount,
            new_balance = %committed.wallet.balance(),
            "Deposit committed"
        );

        Ok(DepositResult {
            user_id: command.user_id,
            currency: command.currency,
            amount: committed.amount,
            new_balance: committed.wallet.balance(),
            version: committed.wallet.version(),
        })
    }
}
