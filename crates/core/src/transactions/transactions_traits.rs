//! Transaction repository and service traits.

use async_trait::async_trait;
use chrono::NaiveDateTime;

use super::transactions_model::{
    NewTransaction, Transaction, TransactionDetails, TransactionDraft, TransactionPage,
    TransactionQuery, TransactionUpdate,
};
use crate::errors::Result;

/// Trait defining the contract for transaction persistence.
#[async_trait]
pub trait TransactionRepositoryTrait: Send + Sync {
    /// Writes the transaction, its number, its entries, its total and every
    /// touched account balance in one database transaction.
    async fn create(&self, draft: TransactionDraft) -> Result<TransactionDetails>;

    /// Updates header fields.
    ///
    /// A currency change is rejected with `ConstraintViolation` while entries
    /// exist on accounts kept in another currency.
    async fn update(&self, update: TransactionUpdate) -> Result<Transaction>;

    /// Deletes the transaction and its entries, reversing the entry amounts on
    /// their accounts. Returns the transaction as it was.
    async fn delete(&self, transaction_id: &str) -> Result<TransactionDetails>;

    /// Replaces the stored total with the sum of the entries.
    async fn recalculate_total(&self, transaction_id: &str) -> Result<Transaction>;

    fn get_by_id(&self, transaction_id: &str) -> Result<Transaction>;

    fn get_details(&self, transaction_id: &str) -> Result<TransactionDetails>;

    /// Ordered by `incurred_at` desc, then number desc.
    fn search(
        &self,
        query: &TransactionQuery,
        page: i64,
        page_size: i64,
    ) -> Result<TransactionPage>;

    /// Transactions with `from <= incurred_at < to`; open bounds when `None`.
    fn list_in_range(
        &self,
        from: Option<NaiveDateTime>,
        to: Option<NaiveDateTime>,
    ) -> Result<Vec<Transaction>>;
}

/// Trait defining the contract for transaction service operations.
#[async_trait]
pub trait TransactionServiceTrait: Send + Sync {
    async fn create_transaction(&self, new_transaction: NewTransaction)
        -> Result<TransactionDetails>;

    async fn update_transaction(&self, update: TransactionUpdate) -> Result<Transaction>;

    async fn delete_transaction(&self, transaction_id: &str) -> Result<TransactionDetails>;

    fn get_transaction(&self, transaction_id: &str) -> Result<TransactionDetails>;

    /// 0-based paged search.
    fn search_transactions(
        &self,
        query: &TransactionQuery,
        page: i64,
        page_size: i64,
    ) -> Result<TransactionPage>;
}
