use async_trait::async_trait;
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::entries_model::{
    build_register, check_entry_draft, Entry, EntryUpdate, NewEntry, RegisterPage,
};
use super::entries_traits::{EntryRepositoryTrait, EntryServiceTrait};
use crate::accounts::{Account, AccountFilter, AccountRepositoryTrait};
use crate::errors::{Error, Result, ValidationError};
use crate::events::{DomainEvent, DomainEventSink};
use crate::paging::normalize_page;
use crate::transactions::TransactionRepositoryTrait;

pub struct EntryService {
    entry_repository: Arc<dyn EntryRepositoryTrait>,
    transaction_repository: Arc<dyn TransactionRepositoryTrait>,
    account_repository: Arc<dyn AccountRepositoryTrait>,
    event_sink: Arc<dyn DomainEventSink>,
}

impl EntryService {
    pub fn new(
        entry_repository: Arc<dyn EntryRepositoryTrait>,
        transaction_repository: Arc<dyn TransactionRepositoryTrait>,
        account_repository: Arc<dyn AccountRepositoryTrait>,
        event_sink: Arc<dyn DomainEventSink>,
    ) -> Self {
        Self {
            entry_repository,
            transaction_repository,
            account_repository,
            event_sink,
        }
    }

    fn account_map(&self) -> Result<HashMap<String, Account>> {
        Ok(self
            .account_repository
            .list(&AccountFilter::default())?
            .into_iter()
            .map(|a| (a.id.clone(), a))
            .collect())
    }

    fn emit_changed(&self, transaction_id: &str, account_ids: Vec<String>) {
        self.event_sink.emit(DomainEvent::transactions_changed(
            vec![transaction_id.to_string()],
            account_ids,
        ));
    }
}

pub(crate) fn clean_reference(reference: Option<String>) -> Option<String> {
    reference
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
}

#[async_trait]
impl EntryServiceTrait for EntryService {
    async fn add_entry(&self, transaction_id: &str, new_entry: NewEntry) -> Result<Entry> {
        let transaction = self.transaction_repository.get_by_id(transaction_id)?;
        let issues = check_entry_draft(
            0,
            &new_entry,
            Some(transaction.currency.as_str()),
            &self.account_map()?,
        );
        if !issues.is_empty() {
            return Err(Error::Validation(ValidationError::Entries(issues)));
        }

        let entry = Entry {
            id: Uuid::new_v4().to_string(),
            transaction_id: transaction.id.clone(),
            account_id: new_entry
                .account_id
                .map(|id| id.trim().to_string())
                .unwrap_or_default(),
            amount: new_entry.amount,
            recorded_at: new_entry.recorded_at.unwrap_or(transaction.incurred_at),
            reference: clean_reference(new_entry.reference),
        };
        let saved = self.entry_repository.insert(entry).await?;
        debug!(
            "Added entry {} of {} to transaction {}",
            saved.id, saved.amount, transaction.number
        );
        self.emit_changed(&saved.transaction_id, vec![saved.account_id.clone()]);
        Ok(saved)
    }

    async fn update_entry(&self, update: EntryUpdate) -> Result<Entry> {
        let current = self.entry_repository.get_by_id(&update.id)?;
        let transaction = self
            .transaction_repository
            .get_by_id(&current.transaction_id)?;

        let draft = NewEntry {
            account_id: Some(update.account_id.clone()),
            currency: Some(transaction.currency.clone()),
            amount: update.amount,
            recorded_at: update.recorded_at,
            reference: update.reference.clone(),
        };
        let issues = check_entry_draft(
            0,
            &draft,
            Some(transaction.currency.as_str()),
            &self.account_map()?,
        );
        if !issues.is_empty() {
            return Err(Error::Validation(ValidationError::Entries(issues)));
        }

        let updated = Entry {
            id: current.id.clone(),
            transaction_id: current.transaction_id.clone(),
            account_id: update.account_id.trim().to_string(),
            amount: update.amount,
            recorded_at: update.recorded_at.unwrap_or(current.recorded_at),
            reference: clean_reference(update.reference),
        };
        let saved = self.entry_repository.update(updated).await?;
        if saved.account_id != current.account_id {
            debug!(
                "Moved entry {} from account {} to {}",
                saved.id, current.account_id, saved.account_id
            );
        }
        self.emit_changed(
            &saved.transaction_id,
            vec![current.account_id, saved.account_id.clone()],
        );
        Ok(saved)
    }

    async fn delete_entry(&self, entry_id: &str) -> Result<Entry> {
        let deleted = self.entry_repository.delete(entry_id).await?;
        self.emit_changed(&deleted.transaction_id, vec![deleted.account_id.clone()]);
        Ok(deleted)
    }

    fn entries_for_transaction(&self, transaction_id: &str) -> Result<Vec<Entry>> {
        self.entry_repository.list_for_transaction(transaction_id)
    }

    fn account_register(
        &self,
        account_id: &str,
        page: i64,
        page_size: i64,
    ) -> Result<RegisterPage> {
        let (page, page_size) = normalize_page(page, page_size)?;
        let account = self.account_repository.get_by_id(account_id)?;
        let rows = self.entry_repository.list_for_account(&account.id)?;
        Ok(build_register(rows, page, page_size))
    }
}
