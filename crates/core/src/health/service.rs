//! Ledger consistency service.

use async_trait::async_trait;
use chrono::Utc;
use log::{info, warn};
use std::sync::Arc;

use super::model::{find_mismatches, ConsistencyReport};
use super::traits::HealthServiceTrait;
use crate::accounts::{AccountFilter, AccountRepositoryTrait};
use crate::entries::EntryRepositoryTrait;
use crate::errors::Result;
use crate::events::{DomainEvent, DomainEventSink};
use crate::transactions::TransactionRepositoryTrait;

pub struct HealthService {
    account_repository: Arc<dyn AccountRepositoryTrait>,
    transaction_repository: Arc<dyn TransactionRepositoryTrait>,
    entry_repository: Arc<dyn EntryRepositoryTrait>,
    event_sink: Arc<dyn DomainEventSink>,
}

impl HealthService {
    pub fn new(
        account_repository: Arc<dyn AccountRepositoryTrait>,
        transaction_repository: Arc<dyn TransactionRepositoryTrait>,
        entry_repository: Arc<dyn EntryRepositoryTrait>,
        event_sink: Arc<dyn DomainEventSink>,
    ) -> Self {
        Self {
            account_repository,
            transaction_repository,
            entry_repository,
            event_sink,
        }
    }
}

#[async_trait]
impl HealthServiceTrait for HealthService {
    fn check(&self) -> Result<ConsistencyReport> {
        let accounts = self.account_repository.list(&AccountFilter::default())?;
        let transactions = self.transaction_repository.list_in_range(None, None)?;
        let entries = self.entry_repository.list_all()?;

        let report = find_mismatches(
            &accounts,
            &transactions,
            &entries,
            Utc::now().naive_utc(),
        );
        for mismatch in &report.account_mismatches {
            warn!(
                "Account '{}' stores balance {} but its entries sum to {}",
                mismatch.account_name, mismatch.stored_balance, mismatch.computed_balance
            );
        }
        for mismatch in &report.transaction_mismatches {
            warn!(
                "Transaction #{} stores total {} but its entries sum to {}",
                mismatch.number, mismatch.stored_total, mismatch.computed_total
            );
        }
        Ok(report)
    }

    async fn repair(&self) -> Result<ConsistencyReport> {
        let report = self.check()?;
        if report.is_consistent() {
            return Ok(report);
        }

        let mut account_ids = Vec::new();
        for mismatch in &report.account_mismatches {
            self.account_repository
                .recalculate_balance(&mismatch.account_id)
                .await?;
            account_ids.push(mismatch.account_id.clone());
        }
        let mut transaction_ids = Vec::new();
        for mismatch in &report.transaction_mismatches {
            self.transaction_repository
                .recalculate_total(&mismatch.transaction_id)
                .await?;
            transaction_ids.push(mismatch.transaction_id.clone());
        }

        info!(
            "Repaired {} account balances and {} transaction totals",
            account_ids.len(),
            transaction_ids.len()
        );
        let mut events = Vec::new();
        if !account_ids.is_empty() {
            events.push(DomainEvent::accounts_changed(account_ids.clone()));
        }
        if !transaction_ids.is_empty() {
            events.push(DomainEvent::transactions_changed(transaction_ids, account_ids));
        }
        self.event_sink.emit_batch(events);

        Ok(report)
    }
}
