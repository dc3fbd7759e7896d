//! Withdraw Handler
//!
//! Debits an existing wallet towards an external address. A missing wallet
//! is an input error, not an insufficient balance.

use crate::domain::OperationContext;
use crate::error::AppError;

use super::ledger::Ledger;
use super::mutation::{self, WalletMutation};
use super::{WithdrawCommand, WithdrawResult};

/// Handler for withdrawals
pub struct WithdrawHandler {
    ledger: Ledger,
}

impl WithdrawHandler {
    pub fn new(ledger: Ledger) -> Self {
        Self { ledger }
    }

    /// Execute the withdraw command
    pub async fn execute(
        &self,
        command: WithdrawCommand,
        context: &OperationContext,
    ) -> Result<WithdrawResult, AppError> {
        self.ledger.validator().withdraw(&command).await?;

        let committed = mutation::commit(
            &self.ledger,
            command.user_id,
            &command.currency,
            WalletMutation::Withdraw(command.amount),
            context,
        )
        .await?;

        tracing::info!(
            user_id = %command.user_id,
            currency = %command.currency,
            amount = %committed.amount,
            new_balance = %committed.wallet.balance(),
            destination_address = %command.destination_address,
            "Withdrawal committed"
        );

        Ok(WithdrawResult {
            user_id: command.user_id,
            currency: command.currency,
            amount: committed.amount,
            new_balance: committed.wallet.balance(),
            destination_address: command.destination_address,
            version: committed.wallet.version(),
        })
    }
}
