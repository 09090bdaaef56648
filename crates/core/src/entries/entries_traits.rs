use async_trait::async_trait;

use super::entries_model::{Entry, EntryUpdate, EntryWithTransaction, NewEntry, RegisterPage};
use crate::errors::Result;

/// Persistence for entries.
///
/// Every write applies the matching [`plan_entry_change`](super::plan_entry_change)
/// to account balances and the transaction total inside the same database
/// transaction as the entry row itself.
#[async_trait]
pub trait EntryRepositoryTrait: Send + Sync {
    async fn insert(&self, entry: Entry) -> Result<Entry>;

    /// Replaces the stored entry with the same ID.
    async fn update(&self, entry: Entry) -> Result<Entry>;

    /// Deletes an entry and returns it as it was.
    async fn delete(&self, entry_id: &str) -> Result<Entry>;

    fn get_by_id(&self, entry_id: &str) -> Result<Entry>;

    fn list_for_transaction(&self, transaction_id: &str) -> Result<Vec<Entry>>;

    /// Entries booked against an account, with their transaction headers.
    fn list_for_account(&self, account_id: &str) -> Result<Vec<EntryWithTransaction>>;

    fn list_all(&self) -> Result<Vec<Entry>>;
}

#[async_trait]
pub trait EntryServiceTrait: Send + Sync {
    async fn add_entry(&self, transaction_id: &str, new_entry: NewEntry) -> Result<Entry>;

    async fn update_entry(&self, update: EntryUpdate) -> Result<Entry>;

    async fn delete_entry(&self, entry_id: &str) -> Result<Entry>;

    fn entries_for_transaction(&self, transaction_id: &str) -> Result<Vec<Entry>>;

    /// The account's entries with running balances, newest first, 0-based pages.
    fn account_register(&self, account_id: &str, page: i64, page_size: i64)
        -> Result<RegisterPage>;
}
