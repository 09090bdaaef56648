use log::debug;
use std::sync::Arc;

use super::accounts_model::{Account, AccountFilter, AccountUpdate, NewAccount};
use super::accounts_traits::{AccountRepositoryTrait, AccountServiceTrait};
use crate::errors::Result;
use crate::events::{DomainEvent, DomainEventSink};
use crate::fx::normalize_currency_code;

/// Service for managing accounts
pub struct AccountService {
    repository: Arc<dyn AccountRepositoryTrait>,
    event_sink: Arc<dyn DomainEventSink>,
}

impl AccountService {
    pub fn new(
        repository: Arc<dyn AccountRepositoryTrait>,
        event_sink: Arc<dyn DomainEventSink>,
    ) -> Self {
        Self {
            repository,
            event_sink,
        }
    }

    fn emit_changed(&self, account_id: &str) {
        self.event_sink
            .emit(DomainEvent::accounts_changed(vec![account_id.to_string()]));
    }
}

#[async_trait::async_trait]
impl AccountServiceTrait for AccountService {
    async fn create_account(&self, new_account: NewAccount) -> Result<Account> {
        let new_account = new_account.normalized()?;
        debug!(
            "Creating {} account '{}' in {}",
            new_account.account_type, new_account.name, new_account.currency
        );
        let account = self.repository.create(new_account).await?;
        self.emit_changed(&account.id);
        Ok(account)
    }

    async fn update_account(&self, mut account_update: AccountUpdate) -> Result<Account> {
        account_update.validate()?;
        account_update.name = account_update.name.trim().to_string();
        account_update.currency = account_update
            .currency
            .as_deref()
            .map(normalize_currency_code)
            .transpose()?;
        let account = self.repository.update(account_update).await?;
        self.emit_changed(&account.id);
        Ok(account)
    }

    async fn delete_account(&self, account_id: &str) -> Result<()> {
        self.repository.delete(account_id).await?;
        self.emit_changed(account_id);
        Ok(())
    }

    async fn recalculate_balance(&self, account_id: &str) -> Result<Account> {
        let account = self.repository.recalculate_balance(account_id).await?;
        self.emit_changed(&account.id);
        Ok(account)
    }

    fn get_account(&self, account_id: &str) -> Result<Account> {
        self.repository.get_by_id(account_id)
    }

    fn list_accounts(&self, filter: &AccountFilter) -> Result<Vec<Account>> {
        self.repository.list(filter)
    }

    fn get_all_accounts(&self) -> Result<Vec<Account>> {
        self.repository.list(&AccountFilter::default())
    }
}
