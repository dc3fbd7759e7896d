//! Amount and Balance types
//!
//! Domain primitives for monetary values. Amounts are requested quantities
//! (strictly positive, any precision); balances are stored quantities
//! (non-negative, at most 8 decimal places).

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fractional digits kept on every stored value
pub const MAX_SCALE: u32 = 8;

/// Total significant digits accepted for a requested amount
pub const MAX_PRECISION: u32 = 18;

/// Amount represents a requested monetary value.
///
/// # Invariants
/// - Value is always positive (> 0)
///
/// Precision is not enforced here: the ledger truncates to 8 decimal places
/// when the amount is applied, and the validation layer decides which commands
/// reject excess precision up front.
///
/// # Example
/// ```
/// use rust_decimal::Decimal;
/// use custodial_wallet::domain::Amount;
///
/// let amount = Amount::new(Decimal::new(1123456789, 9)).unwrap();
/// assert_eq!(amount.truncated(), Decimal::new(112345678, 8));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Amount(Decimal);

/// Errors that can occur when creating an Amount or moving a Balance
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("Amount must be positive (got {0})")]
    NotPositive(Decimal),

    #[error("Balance cannot go negative (got {0})")]
    Negative(Decimal),

    #[error("Amount exceeds the representable range")]
    Overflow,

    #[error("Invalid amount format: {0}")]
    ParseError(String),
}

impl Amount {
    /// Create a new Amount.
    ///
    /// # Errors
    /// - `AmountError::NotPositive` if value <= 0
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value <= Decimal::ZERO {
            return Err(AmountError::NotPositive(value));
        }
        Ok(Self(value))
    }

    /// Get the requested value, untouched.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// The value the ledger actually moves: truncated toward zero to 8 places.
    pub fn truncated(&self) -> Decimal {
        truncate(self.0)
    }

    /// Number of fractional digits as written (trailing zeros count).
    pub fn scale(&self) -> u32 {
        self.0.scale()
    }

    /// Number of digits left of the decimal point (0 for values below 1).
    pub fn integer_digits(&self) -> u32 {
        let integral = self.0.trunc();
        if integral.is_zero() {
            0
        } else {
            integral.to_string().len() as u32
        }
    }

    /// Check against a SQL-style `NUMERIC(precision, scale)` shape.
    pub fn fits(&self, precision: u32, scale: u32) -> bool {
        self.scale() <= scale && self.integer_digits() <= precision.saturating_sub(scale)
    }
}

/// Truncate toward zero to the ledger scale, never rounding up.
pub fn truncate(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MAX_SCALE, RoundingStrategy::ToZero)
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decimal = Decimal::from_str(s.trim())
            .map_err(|e| AmountError::ParseError(e.to_string()))?;
        Amount::new(decimal)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Amount::new(value)
    }
}

/// Balance represents a wallet balance (zero or positive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Balance(Decimal);

impl Balance {
    /// Create a new balance (zero or positive)
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value < Decimal::ZERO {
            return Err(AmountError::Negative(value));
        }
        Ok(Self(value))
    }

    /// Create a zero balance
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Get the underlying value
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Check if balance covers a withdrawal of `amount`
    pub fn is_sufficient_for(&self, amount: Decimal) -> bool {
        self.0 >= amount
    }

    /// Add an already-truncated amount
    pub fn credit(&self, amount: Decimal) -> Result<Balance, AmountError> {
        let new_value = self.0.checked_add(amount).ok_or(AmountError::Overflow)?;
        Balance::new(new_value)
    }

    /// Subtract an already-truncated amount
    pub fn debit(&self, amount: Decimal) -> Result<Balance, AmountError> {
        let new_value = self.0.checked_sub(amount).ok_or(AmountError::Overflow)?;
        Balance::new(new_value)
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.8}", self.0)
    }
}

impl Default for Balance {
    fn default() -> Self {
        Self::zero()
    }
}
