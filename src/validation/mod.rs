//! Validation module
//!
//! Per-field rule chains that accumulate into one ordered report.
//! A field stops at its first failing rule; other fields keep going.

mod commands;

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::storage::StorageResult;

pub use commands::CommandValidator;

/// Machine-readable failure codes
pub mod codes {
    pub const REQUIRED: &str = "required";
    pub const INVALID_FORMAT: &str = "invalid_format";
    pub const UNSUPPORTED_CURRENCY: &str = "unsupported_currency";
    pub const MUST_BE_POSITIVE: &str = "must_be_positive";
    pub const PRECISION_EXCEEDED: &str = "precision_exceeded";
    pub const USER_NOT_FOUND: &str = "user_not_found";
    pub const WALLET_NOT_FOUND: &str = "wallet_not_found";
}

/// One failed rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub code: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, code: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            code: code.to_string(),
            message: message.into(),
        }
    }
}

/// Non-empty, ordered collection of field failures
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// Report holding a single failure
    pub fn single(field: &str, code: &str, message: impl Into<String>) -> Self {
        Self(vec![FieldError::new(field, code, message)])
    }

    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// Whether any failure carries `code`
    pub fn has_code(&self, code: &str) -> bool {
        self.0.iter().any(|e| e.code == code)
    }

    /// All messages, newline-joined
    pub fn joined_messages(&self) -> String {
        self.0
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined_messages())
    }
}

impl std::error::Error for ValidationErrors {}

/// Collects failures across fields
#[derive(Debug, Default)]
pub struct Validator {
    errors: ValidationErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the rule chain for one field
    pub fn field(&mut self, name: &'static str) -> FieldRules<'_> {
        FieldRules {
            errors: &mut self.errors,
            field: name,
            failed: false,
        }
    }

    /// `Ok(())` when every rule passed, otherwise the full report
    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Rule chain for a single field. Rules after the first failure are skipped.
pub struct FieldRules<'v> {
    errors: &'v mut ValidationErrors,
    field: &'static str,
    failed: bool,
}

impl<'v> FieldRules<'v> {
    /// Eager rule
    pub fn rule(self, passed: bool, code: &'static str, message: impl Into<String>) -> Self {
        self.rule_with(|| passed, code, || message.into())
    }

    /// Lazy rule: neither the check nor the message runs once the chain failed
    pub fn rule_with(
        mut self,
        check: impl FnOnce() -> bool,
        code: &'static str,
        message: impl FnOnce() -> String,
    ) -> Self {
        if !self.failed && !check() {
            self.fail(code, message());
        }
        self
    }

    /// Rule that needs a storage read. Storage errors abort validation.
    pub async fn rule_async<F, Fut>(
        mut self,
        check: F,
        code: &'static str,
        message: impl FnOnce() -> String,
    ) -> StorageResult<FieldRules<'v>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = StorageResult<bool>>,
    {
        if !self.failed && !check().await? {
            self.fail(code, message());
        }
        Ok(self)
    }

    /// Whether every rule so far passed
    pub fn is_valid(&self) -> bool {
        !self.failed
    }

    fn fail(&mut self, code: &'static str, message: String) {
        self.failed = true;
        self.errors.push(FieldError::new(self.field, code, message));
    }
}

/// Email shape: one `@`, non-empty local part and domain, no whitespace,
/// and a domain that does not start or end with a dot.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };

    !local.is_empty()
        && !domain.is_empty()
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}
