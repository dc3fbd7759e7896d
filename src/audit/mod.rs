//! Audit Log
//!
//! One audit record per committed ledger change. Records go to an
//! `AuditSink`; a failing sink is logged and never undoes the change.

use std::net::IpAddr;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::aggregate::Wallet;
use crate::domain::OperationContext;

/// Audit action types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    #[serde(rename = "user.registered")]
    UserRegistered,
    #[serde(rename = "funds.deposited")]
    FundsDeposited,
    #[serde(rename = "funds.withdrawn")]
    FundsWithdrawn,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::UserRegistered => "user.registered",
            AuditAction::FundsDeposited => "funds.deposited",
            AuditAction::FundsWithdrawn => "funds.withdrawn",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single audit entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub action: AuditAction,
    pub user_id: Uuid,
    pub currency: Option<String>,
    pub amount: Option<Decimal>,
    pub resulting_balance: Option<Decimal>,
    pub wallet_version: Option<i64>,
    pub correlation_id: Option<Uuid>,
    pub client_ip: Option<IpAddr>,
    pub created_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Start building a record for `user_id`
    pub fn builder(action: AuditAction, user_id: Uuid) -> AuditRecordBuilder {
        AuditRecordBuilder {
            action,
            user_id,
            currency: None,
            amount: None,
            resulting_balance: None,
            wallet_version: None,
        }
    }
}

/// Builder for creating audit records
#[derive(Debug, Clone)]
pub struct AuditRecordBuilder {
    action: AuditAction,
    user_id: Uuid,
    currency: Option<String>,
    amount: Option<Decimal>,
    resulting_balance: Option<Decimal>,
    wallet_version: Option<i64>,
}

impl AuditRecordBuilder {
    /// Record the wallet state after the change
    pub fn wallet(mut self, wallet: &Wallet) -> Self {
        self.currency = Some(wallet.currency().to_string());
        self.resulting_balance = Some(wallet.balance());
        self.wallet_version = Some(wallet.version());
        self
    }

    /// Set the amount actually moved
    pub fn amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn build(self, context: &OperationContext) -> AuditRecord {
        AuditRecord {
            id: Uuid::new_v4(),
            action: self.action,
            user_id: self.user_id,
            currency: self.currency,
            amount: self.amount,
            resulting_balance: self.resulting_balance,
            wallet_version: self.wallet_version,
            correlation_id: context.correlation_id,
            client_ip: context.client_ip,
            created_at: Utc::now(),
        }
    }
}

/// Audit log error types
#[derive(Debug, thiserror::Error)]
pub enum AuditLogError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Audit sink unavailable: {0}")]
    Unavailable(String),
}

/// Destination for audit records
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, record: &AuditRecord) -> Result<(), AuditLogError>;
}

// =========================================================================
// TracingAuditSink
// =========================================================================

/// Writes audit records as structured log events on the `audit` target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, record: &AuditRecord) -> Result<(), AuditLogError> {
        tracing::info!(
            target: "audit",
            audit_id = %record.id,
            action = %record.action,
            user_id = %record.user_id,
            currency = ?record.currency,
            amount = ?record.amount,
            resulting_balance = ?record.resulting_balance,
            wallet_version = ?record.wallet_version,
            correlation_id = ?record.correlation_id,
            client_ip = ?record.client_ip,
            "Audit record"
        );
        Ok(())
    }
}

// =========================================================================
// MemoryAuditSink
// =========================================================================

/// Keeps audit records in memory
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far
    pub fn records(&self) -> Vec<AuditRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, record: &AuditRecord) -> Result<(), AuditLogError> {
        self.records
            .lock()
            .map_err(|_| AuditLogError::Unavailable("lock poisoned".to_string()))?
            .push(record.clone());
        Ok(())
    }
}

// =========================================================================
// PgAuditSink
// =========================================================================

/// Inserts audit records into `audit_logs`
#[derive(Debug, Clone)]
pub struct PgAuditSink {
    pool: PgPool,
}

impl PgAuditSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for PgAuditSink {
    async fn record(&self, record: &AuditRecord) -> Result<(), AuditLogError> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (
                id, action, user_id, currency, amount,
                resulting_balance, wallet_version, correlation_id, client_ip, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9::inet, $10)
            "#,
        )
        .bind(record.id)
        .bind(record.action.as_str())
        .bind(record.user_id)
        .bind(&record.currency)
        .bind(record.amount)
        .bind(record.resulting_balance)
        .bind(record.wallet_version)
        .bind(record.correlation_id)
        .bind(record.client_ip.map(|ip| ip.to_string()))
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        tracing::debug!(
            audit_id = %record.id,
            action = %record.action,
            "Audit log entry created"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_audit_action_as_str() {
        assert_eq!(AuditAction::UserRegistered.as_str(), "user.registered");
        assert_eq!(AuditAction::FundsDeposited.to_string(), "funds.deposited");
        assert_eq!(
            serde_json::to_value(AuditAction::FundsWithdrawn).unwrap(),
            serde_json::json!("funds.withdrawn")
        );
    }

    #[test]
    fn test_builder_copies_wallet_state() {
        let mut wallet = Wallet::open(Uuid::new_v4(), "ETH");
        wallet.deposit(dec!(2.5)).unwrap();
        let correlation_id = Uuid::new_v4();
        let client_ip: IpAddr = "192.0.2.10".parse().unwrap();
        let context = OperationContext::new()
            .with_correlation_id(correlation_id)
            .with_client_ip(client_ip);

        let record = AuditRecord::builder(AuditAction::FundsDeposited, wallet.user_id())
            .wallet(&wallet)
            .amount(dec!(2.5))
            .build(&context);

        assert_eq!(record.currency.as_deref(), Some("ETH"));
        assert_eq!(record.amount, Some(dec!(2.5)));
        assert_eq!(record.resulting_balance, Some(dec!(2.5)));
        assert_eq!(record.wallet_version, Some(1));
        assert_eq!(record.correlation_id, Some(correlation_id));
        assert_eq!(record.client_ip, Some(client_ip));
    }

    #[tokio::test]
    async fn test_memory_sink_keeps_records() {
        let sink = MemoryAuditSink::new();
        let record = AuditRecord::builder(AuditAction::UserRegistered, Uuid::new_v4())
            .build(&OperationContext::new());

        sink.record(&record).await.unwrap();
        TracingAuditSink.record(&record).await.unwrap();

        assert_eq!(sink.records(), vec![record]);
        assert!(!sink.is_empty());
    }
}
