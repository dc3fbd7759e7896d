//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use rust_decimal::Decimal;
use thiserror::Error;

/// Domain-specific errors
///
/// These errors represent business rule violations raised by the wallet
/// aggregate. They are independent of the web/infrastructure layer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Invalid amount (zero, negative, or out of range)
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Balance does not cover the withdrawal
    #[error("Insufficient funds: required {required}, available {available} {currency}")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
        currency: String,
    },
}

impl DomainError {
    /// Create an insufficient funds error
    pub fn insufficient_funds(
        required: Decimal,
        available: Decimal,
        currency: impl Into<String>,
    ) -> Self {
        Self::InsufficientFunds {
            required,
            available,
            currency: currency.into(),
        }
    }
}

impl From<super::AmountError> for DomainError {
    fn from(err: super::AmountError) -> Self {
        Self::InvalidAmount(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AmountError;

    #[test]
    fn test_insufficient_funds_error() {
        let err = DomainError::insufficient_funds(Decimal::new(100, 0), Decimal::new(50, 0), "BTC");

        assert!(err.to_string().contains("100"));
        assert!(err.to_string().contains("50"));
        assert!(err.to_string().contains("BTC"));
    }

    #[test]
    fn test_amount_error_maps_to_invalid_amount() {
        let err: DomainError = AmountError::NotPositive(Decimal::ZERO).into();
        assert!(matches!(err, DomainError::InvalidAmount(_)));
    }
}
