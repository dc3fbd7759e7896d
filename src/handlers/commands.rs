//! Command definitions
//!
//! Commands represent intentions to change (or read) ledger state.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =========================================================================
// RegisterUserCommand
// =========================================================================

/// Command to register a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserCommand {
    pub email: String,
}

impl RegisterUserCommand {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
        }
    }
}

// =========================================================================
// DepositCommand
// =========================================================================

/// Command to credit a user's wallet, opening it on first use
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositCommand {
    pub user_id: Uuid,
    pub currency: String,
    pub amount: Decimal,
}

impl DepositCommand {
    pub fn new(user_id: Uuid, currency: impl Into<String>, amount: Decimal) -> Self {
        Self {
            user_id,
            currency: currency.into(),
            amount,
        }
    }
}

// =========================================================================
// WithdrawCommand
// =========================================================================

/// Command to debit an existing wallet towards an external address
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawCommand {
    pub user_id: Uuid,
    pub currency: String,
    pub amount: Decimal,
    pub destination_address: String,
}

impl WithdrawCommand {
    pub fn new(
        user_id: Uuid,
        currency: impl Into<String>,
        amount: Decimal,
        destination_address: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            currency: currency.into(),
            amount,
            destination_address: destination_address.into(),
        }
    }
}

// =========================================================================
// BalanceQuery
// =========================================================================

/// Read a user's balances, optionally restricted to one currency
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceQuery {
    pub user_id: Uuid,
    pub currency: Option<String>,
}

impl BalanceQuery {
    pub fn all(user_id: Uuid) -> Self {
        Self {
            user_id,
            currency: None,
        }
    }

    pub fn currency(user_id: Uuid, currency: impl Into<String>) -> Self {
        Self {
            user_id,
            currency: Some(currency.into()),
        }
    }
}

/// Result of a successful registration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterUserResult {
    pub user_id: Uuid,
    pub email: String,
    pub balance: Decimal,
}

/// Result of a committed deposit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositResult {
    pub user_id: Uuid,
    pub currency: String,
    /// Amount actually credited (after truncation)
    pub amount: Decimal,
    pub new_balance: Decimal,
    pub version: i64,
}

/// Result of a committed withdrawal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawResult {
    pub user_id: Uuid,
    pub currency: String,
    /// Amount actually debited (after truncation)
    pub amount: Decimal,
    pub new_balance: Decimal,
    pub destination_address: String,
    pub version: i64,
}

/// Balance of one wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletBalance {
    pub currency: String,
    pub balance: Decimal,
}

/// Result of a balance query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceView {
    pub user_id: Uuid,
    pub wallets: Vec<WalletBalance>,
}

impl BalanceView {
    /// Balance in `currency`, zero when the user has no such wallet
    pub fn balance_of(&self, currency: &str) -> Decimal {
        self.wallets
            .iter()
            .find(|w| w.currency == currency)
            .map(|w| w.balance)
            .unwrap_or(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_withdraw_command() {
        let user_id = Uuid::new_v4();
        let cmd = WithdrawCommand::new(user_id, "ETH", dec!(10), "0xabc");

        assert_eq!(cmd.user_id, user_id);
        assert_eq!(cmd.currency, "ETH");
        assert_eq!(cmd.destination_address, "0xabc");
    }

    #[test]
    fn test_balance_of_missing_currency_is_zero() {
        let view = BalanceView {
            user_id: Uuid::new_v4(),
            wallets: vec![WalletBalance {
                currency: "BTC".to_string(),
                balance: dec!(1.5),
            }],
        };

        assert_eq!(view.balance_of("BTC"), dec!(1.5));
        assert_eq!(view.balance_of("ETH"), Decimal::ZERO);
    }
}
