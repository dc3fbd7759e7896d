//! Wallet Aggregate
//!
//! Wallet is the core aggregate for a user's balance in one currency.
//! Deposits and withdrawals are pure state transitions; persistence and
//! serialization of concurrent writers are the orchestrator's job.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Amount, AmountError, Balance, DomainError};

/// Wallet Aggregate
///
/// One balance record per (user, currency). The version counts committed
/// mutations and is the compare-and-swap token for storage updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// Unique wallet ID
    id: Uuid,

    /// Owner user ID
    user_id: Uuid,

    /// Currency ticker (BTC, ETH, USDT, ...)
    currency: String,

    /// Current balance, never negative
    balance: Balance,

    /// Number of committed mutations
    version: i64,
}

impl Wallet {
    /// Open a fresh, not yet persisted wallet with a zero balance
    pub fn open(user_id: Uuid, currency: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            currency: currency.into(),
            balance: Balance::zero(),
            version: 0,
        }
    }

    /// Rebuild a wallet from stored state
    pub fn from_parts(
        id: Uuid,
        user_id: Uuid,
        currency: String,
        balance: Decimal,
        version: i64,
    ) -> Result<Self, AmountError> {
        Ok(Self {
            id,
            user_id,
            currency,
            balance: Balance::new(balance)?,
            version,
        })
    }

    // =========================================================================
    // Wallet::deposit()
    // =========================================================================

    /// Credit the wallet with `amount` truncated to 8 decimal places.
    /// Returns the amount actually credited.
    pub fn deposit(&mut self, amount: Decimal) -> Result<Decimal, DomainError> {
        let credited = Amount::new(amount)?.truncated();
        self.balance = self.balance.credit(credited)?;
        self.version += 1;
        Ok(credited)
    }

    // =========================================================================
    // Wallet::withdraw()
    // =========================================================================

    /// Debit the wallet by `amount` truncated to 8 decimal places.
    /// Returns the amount actually debited. The balance is untouched on error.
    pub fn withdraw(&mut self, amount: Decimal) -> Result<Decimal, DomainError> {
        let debited = Amount::new(amount)?.truncated();

        if !self.balance.is_sufficient_for(debited) {
            return Err(DomainError::insufficient_funds(
                debited,
                self.balance.value(),
                self.currency.as_str(),
            ));
        }

        self.balance = self.balance.debit(debited)?;
        self.version += 1;
        Ok(debited)
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn balance(&self) -> Decimal {
        self.balance.value()
    }

    pub fn version(&self) -> i64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn funded(balance: Decimal) -> Wallet {
        Wallet::from_parts(Uuid::new_v4(), Uuid::new_v4(), "BTC".to_string(), balance, 1).unwrap()
    }

    #[test]
    fn test_open_wallet() {
        let user_id = Uuid::new_v4();
        let wallet = Wallet::open(user_id, "ETH");

        assert_eq!(wallet.user_id(), user_id);
        assert_eq!(wallet.currency(), "ETH");
        assert_eq!(wallet.balance(), Decimal::ZERO);
        assert_eq!(wallet.version(), 0);
    }

    #[test]
    fn test_deposit_increases_balance_and_version() {
        let mut wallet = Wallet::open(Uuid::new_v4(), "BTC");

        let credited = wallet.deposit(dec!(2.5)).unwrap();

        assert_eq!(credited, dec!(2.5));
        assert_eq!(wallet.balance(), dec!(2.5));
        assert_eq!(wallet.version(), 1);
    }

    #[test]
    fn test_deposit_truncates_ninth_digit() {
        let mut wallet = Wallet::open(Uuid::new_v4(), "BTC");

        wallet.deposit(dec!(1.123456789)).unwrap();

        assert_eq!(wallet.balance(), dec!(1.12345678));
    }

    #[test]
    fn test_deposit_rejects_non_positive() {
        let mut wallet = funded(dec!(10));

        for amount in [Decimal::ZERO, dec!(-1), dec!(-0.00000001)] {
            let result = wallet.deposit(amount);
            assert!(matches!(result, Err(DomainError::InvalidAmount(_))));
        }
        assert_eq!(wallet.balance(), dec!(10));
        assert_eq!(wallet.version(), 1);
    }

    #[test]
    fn test_withdraw_decreases_balance() {
        let mut wallet = funded(dec!(10));

        let debited = wallet.withdraw(dec!(3.000000009)).unwrap();

        assert_eq!(debited, dec!(3));
        assert_eq!(wallet.balance(), dec!(7));
        assert_eq!(wallet.version(), 2);
    }

    #[test]
    fn test_withdraw_whole_balance() {
        let mut wallet = funded(dec!(0.5));

        wallet.withdraw(dec!(0.5)).unwrap();

        assert_eq!(wallet.balance(), Decimal::ZERO);
    }

    #[test]
    fn test_withdraw_insufficient_funds_leaves_state() {
        let mut wallet = funded(dec!(5));

        let result = wallet.withdraw(dec!(5.00000001));

        match result {
            Err(DomainError::InsufficientFunds { required, available, currency }) => {
                assert_eq!(required, dec!(5.00000001));
                assert_eq!(available, dec!(5));
                assert_eq!(currency, "BTC");
            }
            other => panic!("Expected InsufficientFunds, got: {:?}", other),
        }
        assert_eq!(wallet.balance(), dec!(5));
        assert_eq!(wallet.version(), 1);
    }

    #[test]
    fn test_withdraw_rejects_non_positive() {
        let mut wallet = funded(dec!(5));

        let result = wallet.withdraw(Decimal::ZERO);

        assert!(matches!(result, Err(DomainError::InvalidAmount(_))));
        assert_eq!(wallet.version(), 1);
    }

    #[test]
    fn test_deposit_then_withdraw_restores_balance() {
        let mut wallet = funded(dec!(42.42));

        for x in [dec!(0.00000001), dec!(1.123456789), dec!(1000), dec!(7.5)] {
            wallet.deposit(x).unwrap();
            wallet.withdraw(x).unwrap();
            assert_eq!(wallet.balance(), dec!(42.42));
        }
    }

    #[test]
    fn test_deposit_overflow_is_invalid_amount() {
        let mut wallet = funded(Decimal::MAX);

        let result = wallet.deposit(dec!(1));

        assert!(matches!(result, Err(DomainError::InvalidAmount(_))));
        assert_eq!(wallet.balance(), Decimal::MAX);
    }

    #[test]
    fn test_from_parts_rejects_negative_balance() {
        let result = Wallet::from_parts(Uuid::new_v4(), Uuid::new_v4(), "BTC".to_string(), dec!(-1), 3);
        assert!(result.is_err());
    }
}
