//! Ledger
//!
//! Shared state for every handler: the store, the audit sink, the wallet
//! locks, the validator and the settings. Cheap to clone.

use std::sync::Arc;

use crate::audit::{AuditRecord, AuditSink};
use crate::config::LedgerSettings;
use crate::storage::LedgerStore;
use crate::validation::CommandValidator;

use super::locks::WalletLocks;

#[derive(Clone)]
pub struct Ledger {
    store: Arc<dyn LedgerStore>,
    audit: Arc<dyn AuditSink>,
    locks: Arc<WalletLocks>,
    validator: CommandValidator,
    settings: Arc<LedgerSettings>,
}

impl Ledger {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        audit: Arc<dyn AuditSink>,
        settings: LedgerSettings,
    ) -> Self {
        let validator = CommandValidator::new(Arc::clone(&store), &settings.allowed_currencies);
        Self {
            store,
            audit,
            locks: Arc::new(WalletLocks::new()),
            validator,
            settings: Arc::new(settings),
        }
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    pub fn settings(&self) -> &LedgerSettings {
        &self.settings
    }

    pub fn validator(&self) -> &CommandValidator {
        &self.validator
    }

    pub(crate) fn locks(&self) -> &Arc<WalletLocks> {
        &self.locks
    }

    /// Hand a record to the audit sink. Failures are logged only.
    pub(crate) async fn audit(&self, record: AuditRecord) {
        if let Err(e) = self.audit.record(&record).await {
            tracing::error!(
                audit_id = %record.id,
                action = %record.action,
                user_id = %record.user_id,
                "Failed to write audit record: {}",
                e
            );
        }
    }
}
