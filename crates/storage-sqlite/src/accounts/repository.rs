use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use ledgerbook_core::accounts::{
    Account, AccountFilter, AccountRepositoryTrait, AccountUpdate, NewAccount,
};
use ledgerbook_core::entries::BalanceAdjustment;
use ledgerbook_core::errors::{Error, LedgerError, Result};

use super::model::AccountDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::ledger::apply_adjustments;
use crate::schema::{accounts, entries};

/// Repository for managing account data in the database
pub struct AccountRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl AccountRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

fn load_account(conn: &mut SqliteConnection, account_id: &str) -> Result<Account> {
    accounts::table
        .find(account_id)
        .select(AccountDB::as_select())
        .first::<AccountDB>(conn)
        .optional()
        .into_core()?
        .ok_or_else(|| LedgerError::AccountNotFound(account_id.to_string()))?
        .try_into()
}

fn entry_count(conn: &mut SqliteConnection, account_id: &str) -> Result<i64> {
    entries::table
        .filter(entries::account_id.eq(account_id))
        .count()
        .get_result::<i64>(conn)
        .into_core()
}

#[async_trait]
impl AccountRepositoryTrait for AccountRepository {
    async fn create(&self, new_account: NewAccount) -> Result<Account> {
        let account_db: AccountDB = new_account.into();
        self.writer
            .exec(move |conn| {
                diesel::insert_into(accounts::table)
                    .values(&account_db)
                    .execute(conn)
                    .into_core()?;
                account_db.try_into()
            })
            .await
    }

    async fn update(&self, account_update: AccountUpdate) -> Result<Account> {
        let account_id = account_update.id.clone().unwrap_or_default();
        self.writer
            .exec(move |conn| {
                let existing = load_account(conn, &account_id)?;
                let currency = match account_update.currency {
                    Some(currency) if currency != existing.currency => {
                        if entry_count(conn, &account_id)? > 0 {
                            return Err(Error::ConstraintViolation(format!(
                                "Account '{}' already has entries in {}; its currency cannot change",
                                existing.name, existing.currency
                            )));
                        }
                        currency
                    }
                    _ => existing.currency,
                };

                diesel::update(accounts::table.find(&account_id))
                    .set((
                        accounts::name.eq(&account_update.name),
                        accounts::account_type.eq(account_update.account_type.as_db_str()),
                        accounts::currency.eq(&currency),
                        accounts::updated_at.eq(Utc::now().naive_utc()),
                    ))
                    .execute(conn)
                    .into_core()?;

                load_account(conn, &account_id)
            })
            .await
    }

    async fn delete(&self, account_id: &str) -> Result<usize> {
        let account_id = account_id.to_string();
        self.writer
            .exec(move |conn| {
                let entries = entry_count(conn, &account_id)?;
                if entries > 0 {
                    return Err(Error::ConstraintViolation(format!(
                        "Cannot delete account {}: {} entries are booked against it",
                        account_id, entries
                    )));
                }
                diesel::delete(accounts::table.find(&account_id))
                    .execute(conn)
                    .into_core()
            })
            .await
    }

    async fn recalculate_balance(&self, account_id: &str) -> Result<Account> {
        let account_id = account_id.to_string();
        self.writer
            .exec(move |conn| {
                apply_adjustments(
                    conn,
                    &[BalanceAdjustment::Recompute {
                        account_id: account_id.clone(),
                    }],
                )?;
                load_account(conn, &account_id)
            })
            .await
    }

    fn get_by_id(&self, account_id: &str) -> Result<Account> {
        let mut conn = get_connection(&self.pool)?;
        accounts::table
            .find(account_id)
            .select(AccountDB::as_select())
            .first::<AccountDB>(&mut conn)
            .into_core()?
            .try_into()
    }

    fn list(&self, filter: &AccountFilter) -> Result<Vec<Account>> {
        let mut conn = get_connection(&self.pool)?;

        let mut query = accounts::table.into_boxed();
        if let Some(account_type) = filter.account_type {
            query = query.filter(accounts::account_type.eq(account_type.as_db_str()));
        }
        if let Some(currency) = &filter.currency {
            query = query.filter(accounts::currency.eq(currency.to_uppercase()));
        }

        let mut results = query
            .select(AccountDB::as_select())
            .order(accounts::name.asc())
            .load::<AccountDB>(&mut conn)
            .into_core()?
            .into_iter()
            .map(Account::try_from)
            .collect::<Result<Vec<_>>>()?;

        // Type order follows the chart of accounts, not the stored text.
        results.sort_by(|a, b| {
            a.account_type
                .cmp(&b.account_type)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(results)
    }

    fn count_entries(&self, account_id: &str) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;
        entry_count(&mut conn, account_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_db;
    use ledgerbook_core::accounts::AccountType;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_list_orders_by_type_then_name_and_filters() {
        let db = test_db().await;
        db.account("salary", AccountType::Income, "EUR").await;
        db.account("wallet", AccountType::Cash, "EUR").await;
        db.account("bank", AccountType::Cash, "USD").await;
        db.account("rent", AccountType::Expense, "EUR").await;

        let all = db.accounts.list(&AccountFilter::default()).unwrap();
        let ids: Vec<&str> = all.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["bank", "wallet", "rent", "salary"]);
        assert!(all.iter().all(|a| a.balance == Decimal::ZERO));

        let euros_cash = db
            .accounts
            .list(&AccountFilter {
                account_type: Some(AccountType::Cash),
                currency: Some("eur".to_string()),
            })
            .unwrap();
        assert_eq!(euros_cash.len(), 1);
        assert_eq!(euros_cash[0].id, "wallet");
    }

    #[tokio::test]
    async fn test_update_renames_and_changes_currency_while_empty() {
        let db = test_db().await;
        db.account("wallet", AccountType::Cash, "EUR").await;

        let updated = db
            .accounts
            .update(AccountUpdate {
                id: Some("wallet".to_string()),
                name: "Pocket".to_string(),
                account_type: AccountType::Receivable,
                currency: Some("CHF".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(updated.name, "Pocket");
        assert_eq!(updated.account_type, AccountType::Receivable);
        assert_eq!(updated.currency, "CHF");

        let err = db
            .accounts
            .update(AccountUpdate {
                id: Some("ghost".to_string()),
                name: "Ghost".to_string(),
                account_type: AccountType::Cash,
                currency: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Ledger(LedgerError::AccountNotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_and_recalculate() {
        let db = test_db().await;
        db.account("wallet", AccountType::Cash, "EUR").await;

        diesel::update(accounts::table.find("wallet"))
            .set(accounts::balance.eq("17.5"))
            .execute(&mut get_connection(&db.pool).unwrap())
            .unwrap();
        let repaired = db.accounts.recalculate_balance("wallet").await.unwrap();
        assert_eq!(repaired.balance, Decimal::ZERO);
        assert_eq!(db.accounts.count_entries("wallet").unwrap(), 0);

        assert_eq!(db.accounts.delete("wallet").await.unwrap(), 1);
        assert_eq!(db.accounts.delete("wallet").await.unwrap(), 0);
        assert!(db.accounts.get_by_id("wallet").is_err());
    }

    #[tokio::test]
    async fn test_corrupt_balance_surfaces_as_ledger_error() {
        let db = test_db().await;
        db.account("wallet", AccountType::Cash, "EUR").await;
        diesel::update(accounts::table.find("wallet"))
            .set(accounts::balance.eq("n/a"))
            .execute(&mut get_connection(&db.pool).unwrap())
            .unwrap();

        let err = db.accounts.get_by_id("wallet").unwrap_err();
        assert!(matches!(err, Error::Ledger(LedgerError::CorruptAmount { .. })));
    }
}
