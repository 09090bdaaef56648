//! Account repository and service traits.
//!
//! These traits define the contract for account operations without any
//! database-specific types, allowing for different storage implementations.

use async_trait::async_trait;

use super::accounts_model::{Account, AccountFilter, AccountUpdate, NewAccount};
use crate::errors::Result;

/// Trait defining the contract for Account repository operations.
#[async_trait]
pub trait AccountRepositoryTrait: Send + Sync {
    /// Creates a new account with a zero balance.
    async fn create(&self, new_account: NewAccount) -> Result<Account>;

    /// Updates an existing account.
    ///
    /// A currency change is rejected with `ConstraintViolation` once the
    /// account has entries.
    async fn update(&self, account_update: AccountUpdate) -> Result<Account>;

    /// Deletes an account by its ID.
    ///
    /// Accounts with entries cannot be deleted. Returns the number of deleted records.
    async fn delete(&self, account_id: &str) -> Result<usize>;

    /// Recomputes the stored balance from the account's entries.
    async fn recalculate_balance(&self, account_id: &str) -> Result<Account>;

    /// Retrieves an account by its ID.
    fn get_by_id(&self, account_id: &str) -> Result<Account>;

    /// Lists accounts ordered by type, then name.
    fn list(&self, filter: &AccountFilter) -> Result<Vec<Account>>;

    /// Number of entries booked against the account.
    fn count_entries(&self, account_id: &str) -> Result<i64>;
}

/// Trait defining the contract for Account service operations.
#[async_trait]
pub trait AccountServiceTrait: Send + Sync {
    async fn create_account(&self, new_account: NewAccount) -> Result<Account>;

    async fn update_account(&self, account_update: AccountUpdate) -> Result<Account>;

    async fn delete_account(&self, account_id: &str) -> Result<()>;

    /// Recomputes the account's balance from its entries.
    async fn recalculate_balance(&self, account_id: &str) -> Result<Account>;

    fn get_account(&self, account_id: &str) -> Result<Account>;

    fn list_accounts(&self, filter: &AccountFilter) -> Result<Vec<Account>>;

    fn get_all_accounts(&self) -> Result<Vec<Account>>;
}
