//! Command validators
//!
//! One rule set per command. Rules that need stored state read through the
//! ledger store; storage failures abort validation as internal errors.

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::amount::{Amount, MAX_PRECISION, MAX_SCALE};
use crate::error::AppError;
use crate::handlers::{BalanceQuery, DepositCommand, RegisterUserCommand, WithdrawCommand};
use crate::storage::{LedgerStore, StorageError};

use super::{codes, is_valid_email, FieldRules, Validator};

/// Validates ledger commands before they reach the orchestrator
#[derive(Clone)]
pub struct CommandValidator {
    store: Arc<dyn LedgerStore>,
    allowed_currencies: Arc<[String]>,
}

impl CommandValidator {
    pub fn new(store: Arc<dyn LedgerStore>, allowed_currencies: &[String]) -> Self {
        Self {
            store,
            allowed_currencies: allowed_currencies.into(),
        }
    }

    /// Register: email present and well-formed
    pub async fn register(&self, command: &RegisterUserCommand) -> Result<(), AppError> {
        let mut validator = Validator::new();

        validator
            .field("email")
            .rule(!command.email.trim().is_empty(), codes::REQUIRED, "Email is required.")
            .rule_with(
                || is_valid_email(&command.email),
                codes::INVALID_FORMAT,
                || "Email is not a valid address.".to_string(),
            );

        Ok(validator.finish()?)
    }

    /// Deposit: known user, allowed currency, positive amount
    pub async fn deposit(&self, command: &DepositCommand) -> Result<(), AppError> {
        let mut validator = Validator::new();

        self.user_rules(validator.field("user_id"), command.user_id).await?;
        self.currency_rules(validator.field("currency"), &command.currency);

        validator
            .field("amount")
            .rule(command.amount > Decimal::ZERO, codes::MUST_BE_POSITIVE, "Amount must be greater than 0.")
            .rule_with(
                || integer_digits_fit(command.amount),
                codes::PRECISION_EXCEEDED,
                || format!("Amount must have at most {} integer digits.", MAX_PRECISION - MAX_SCALE),
            );

        Ok(validator.finish()?)
    }

    /// Withdraw: known user, allowed currency with an existing wallet,
    /// positive amount of at most 8 decimal places, destination present
    pub async fn withdraw(&self, command: &WithdrawCommand) -> Result<(), AppError> {
        let mut validator = Validator::new();

        let user_known = self
            .user_rules(validator.field("user_id"), command.user_id)
            .await?;

        let currency = self.currency_rules(validator.field("currency"), &command.currency);
        if user_known {
            currency
                .rule_async(
                    || async {
                        let wallet = self
                            .store
                            .get_wallet(command.user_id, &command.currency)
                            .await?;
                        Ok::<_, StorageError>(wallet.is_some())
                    },
                    codes::WALLET_NOT_FOUND,
                    || format!("Wallet in {} was not found.", command.currency),
                )
                .await?;
        }

        validator
            .field("amount")
            .rule(command.amount > Decimal::ZERO, codes::MUST_BE_POSITIVE, "Amount must be greater than 0.")
            .rule_with(
                || precision_fits(command.amount),
                codes::PRECISION_EXCEEDED,
                || {
                    format!(
                        "Amount must have at most {} decimal places and {} digits in total.",
                        MAX_SCALE, MAX_PRECISION
                    )
                },
            );

        validator
            .field("destination_address")
            .rule(
                !command.destination_address.trim().is_empty(),
                codes::REQUIRED,
                "Destination address is required.",
            );

        Ok(validator.finish()?)
    }

    /// Balance query: known user
    pub async fn balance(&self, query: &BalanceQuery) -> Result<(), AppError> {
        let mut validator = Validator::new();

        self.user_rules(validator.field("user_id"), query.user_id).await?;

        Ok(validator.finish()?)
    }

    /// Returns whether the user chain passed
    async fn user_rules(&self, rules: FieldRules<'_>, user_id: Uuid) -> Result<bool, AppError> {
        let rules = rules
            .rule(!user_id.is_nil(), codes::REQUIRED, "User id is required.")
            .rule_async(
                || self.store.user_exists(user_id),
                codes::USER_NOT_FOUND,
                || format!("User with id {} was not found.", user_id),
            )
            .await?;

        Ok(rules.is_valid())
    }

    fn currency_rules<'v>(&self, rules: FieldRules<'v>, currency: &str) -> FieldRules<'v> {
        rules
            .rule(!currency.trim().is_empty(), codes::REQUIRED, "Currency is required.")
            .rule_with(
                || self.allowed_currencies.iter().any(|c| c == currency),
                codes::UNSUPPORTED_CURRENCY,
                || {
                    format!(
                        "Unsupported currency. Allowed: {}.",
                        self.allowed_currencies.join(", ")
                    )
                },
            )
    }
}

fn integer_digits_fit(amount: Decimal) -> bool {
    Amount::new(amount)
        .map(|a| a.integer_digits() <= MAX_PRECISION - MAX_SCALE)
        .unwrap_or(true)
}

fn precision_fits(amount: Decimal) -> bool {
    Amount::new(amount)
        .map(|a| a.fits(MAX_PRECISION, MAX_SCALE))
        .unwrap_or(true)
}
