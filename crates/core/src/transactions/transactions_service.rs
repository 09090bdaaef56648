use async_trait::async_trait;
use log::{debug, info};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::transactions_model::{
    clean_details, NewTransaction, Transaction, TransactionDetails, TransactionDraft,
    TransactionPage, TransactionQuery, TransactionUpdate,
};
use super::transactions_traits::{TransactionRepositoryTrait, TransactionServiceTrait};
use crate::accounts::{Account, AccountFilter, AccountRepositoryTrait};
use crate::categories::CategoryRepositoryTrait;
use crate::entries::{check_entry_draft, clean_reference, Entry};
use crate::errors::{EntryIssue, Error, LedgerError, Result, ValidationError};
use crate::events::{DomainEvent, DomainEventSink};
use crate::fx::normalize_currency_code;
use crate::paging::normalize_page;

pub struct TransactionService {
    transaction_repository: Arc<dyn TransactionRepositoryTrait>,
    account_repository: Arc<dyn AccountRepositoryTrait>,
    category_repository: Arc<dyn CategoryRepositoryTrait>,
    event_sink: Arc<dyn DomainEventSink>,
}

impl TransactionService {
    pub fn new(
        transaction_repository: Arc<dyn TransactionRepositoryTrait>,
        account_repository: Arc<dyn AccountRepositoryTrait>,
        category_repository: Arc<dyn CategoryRepositoryTrait>,
        event_sink: Arc<dyn DomainEventSink>,
    ) -> Self {
        Self {
            transaction_repository,
            account_repository,
            category_repository,
            event_sink,
        }
    }

    fn ensure_category(&self, category_id: &str) -> Result<()> {
        match self.category_repository.get_by_id(category_id)? {
            Some(_) => Ok(()),
            None => Err(LedgerError::CategoryNotFound(category_id.to_string()).into()),
        }
    }

    /// Validates the form and turns it into a draft with generated IDs.
    fn prepare_new_transaction(&self, new_transaction: NewTransaction) -> Result<TransactionDraft> {
        let currency = new_transaction.validate_header()?;
        let category_id = new_transaction
            .category_id
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
        self.ensure_category(&category_id)?;

        let accounts: HashMap<String, Account> = self
            .account_repository
            .list(&AccountFilter::default())?
            .into_iter()
            .map(|a| (a.id.clone(), a))
            .collect();
        let issues: Vec<EntryIssue> = new_transaction
            .entries
            .iter()
            .enumerate()
            .flat_map(|(index, draft)| {
                check_entry_draft(index, draft, Some(currency.as_str()), &accounts)
            })
            .collect();
        if !issues.is_empty() {
            return Err(Error::Validation(ValidationError::Entries(issues)));
        }

        let id = new_transaction
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let incurred_at = new_transaction.incurred_at;
        let entries = new_transaction
            .entries
            .into_iter()
            .map(|draft| Entry {
                id: Uuid::new_v4().to_string(),
                transaction_id: id.clone(),
                account_id: draft
                    .account_id
                    .map(|a| a.trim().to_string())
                    .unwrap_or_default(),
                amount: draft.amount,
                recorded_at: draft.recorded_at.unwrap_or(incurred_at),
                reference: clean_reference(draft.reference),
            })
            .collect();

        Ok(TransactionDraft {
            id,
            category_id,
            description: new_transaction.description.trim().to_string(),
            details: clean_details(new_transaction.details),
            currency,
            incurred_at,
            entries,
        })
    }
}

#[async_trait]
impl TransactionServiceTrait for TransactionService {
    async fn create_transaction(
        &self,
        new_transaction: NewTransaction,
    ) -> Result<TransactionDetails> {
        let draft = self.prepare_new_transaction(new_transaction)?;
        let details = self.transaction_repository.create(draft).await?;
        info!(
            "Created transaction #{} '{}' with {} entries, total {} {}",
            details.transaction.number,
            details.transaction.description,
            details.entries.len(),
            details.transaction.total,
            details.transaction.currency
        );
        self.event_sink.emit(DomainEvent::transactions_changed(
            vec![details.transaction.id.clone()],
            details.account_ids(),
        ));
        Ok(details)
    }

    async fn update_transaction(&self, mut update: TransactionUpdate) -> Result<Transaction> {
        update.validate()?;
        update.category_id = update.category_id.trim().to_string();
        update.description = update.description.trim().to_string();
        update.details = clean_details(update.details);
        update.currency = update
            .currency
            .as_deref()
            .map(normalize_currency_code)
            .transpose()?;
        self.ensure_category(&update.category_id)?;

        let transaction = self.transaction_repository.update(update).await?;
        debug!("Updated transaction #{}", transaction.number);
        self.event_sink.emit(DomainEvent::transactions_changed(
            vec![transaction.id.clone()],
            Vec::new(),
        ));
        Ok(transaction)
    }

    async fn delete_transaction(&self, transaction_id: &str) -> Result<TransactionDetails> {
        let deleted = self.transaction_repository.delete(transaction_id).await?;
        info!(
            "Deleted transaction #{} and {} entries",
            deleted.transaction.number,
            deleted.entries.len()
        );
        self.event_sink.emit(DomainEvent::transactions_changed(
            vec![deleted.transaction.id.clone()],
            deleted.account_ids(),
        ));
        Ok(deleted)
    }

    fn get_transaction(&self, transaction_id: &str) -> Result<TransactionDetails> {
        self.transaction_repository.get_details(transaction_id)
    }

    fn search_transactions(
        &self,
        query: &TransactionQuery,
        page: i64,
        page_size: i64,
    ) -> Result<TransactionPage> {
        let (page, page_size) = normalize_page(page, page_size)?;
        let mut query = query.clone();
        query.keyword = query
            .keyword
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        self.transaction_repository.search(&query, page, page_size)
    }
}
