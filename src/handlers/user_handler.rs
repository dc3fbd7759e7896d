//! User Registration Handler
//!
//! Registers a user by email. No wallet is opened until the first deposit.

use rust_decimal::Decimal;

use crate::aggregate::User;
use crate::audit::{AuditAction, AuditRecord};
use crate::domain::OperationContext;
use crate::error::AppError;
use crate::storage::StorageError;

use super::ledger::Ledger;
use super::{RegisterUserCommand, RegisterUserResult};

/// Handler for user registration
pub struct RegisterUserHandler {
    ledger: Ledger,
}

impl RegisterUserHandler {
    pub fn new(ledger: Ledger) -> Self {
        Self { ledger }
    }

    /// Execute the register user command
    pub async fn execute(
        &self,
        command: RegisterUserCommand,
        context: &OperationContext,
    ) -> Result<RegisterUserResult, AppError> {
        self.ledger.validator().register(&command).await?;

        let store = self.ledger.store();

        if store.get_user_by_email(&command.email).await?.is_some() {
            return Err(email_taken(&command.email));
        }

        let user = User::register(command.email);

        // A concurrent registration may still win the race on insert
        store.add_user(&user).await.map_err(|e| match e {
            StorageError::DuplicateEmail(email) => email_taken(&email),
            other => AppError::Storage(other),
        })?;

        let record = AuditRecord::builder(AuditAction::UserRegistered, user.id()).build(context);
        self.ledger.audit(record).await;

        tracing::info!(user_id = %user.id(), "User registered");

        Ok(RegisterUserResult {
            user_id: user.id(),
            email: user.email().to_string(),
            balance: Decimal::ZERO,
        })
    }
}

fn email_taken(email: &str) -> AppError {
    AppError::Conflict(format!("Email {} is already registered.", email))
}
