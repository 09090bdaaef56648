//! Temp-file databases for repository tests.

use chrono::{NaiveDate, NaiveDateTime};
use std::sync::Arc;
use tempfile::{tempdir, TempDir};

use ledgerbook_core::accounts::{Account, AccountRepositoryTrait, AccountType, NewAccount};
use ledgerbook_core::categories::{Category, CategoryRepositoryTrait, NewCategory};

use crate::db::{create_pool, run_migrations, spawn_writer, DbPool};
use crate::{
    AccountRepository, CategoryRepository, EntryRepository, FxRepository, TransactionRepository,
};

pub struct TestDb {
    pub pool: Arc<DbPool>,
    pub accounts: AccountRepository,
    pub categories: CategoryRepository,
    pub transactions: TransactionRepository,
    pub entries: EntryRepository,
    pub fx: FxRepository,
    // Keeps the database file alive for the duration of the test.
    _dir: TempDir,
}

pub async fn test_db() -> TestDb {
    let dir = tempdir().expect("Failed to create temp directory");
    let db_path = dir.path().join("test.db").to_string_lossy().to_string();

    let pool = create_pool(&db_path).expect("Failed to create pool");
    run_migrations(&pool).expect("Failed to run migrations");
    let writer = spawn_writer((*pool).clone());

    TestDb {
        accounts: AccountRepository::new(pool.clone(), writer.clone()),
        categories: CategoryRepository::new(pool.clone(), writer.clone()),
        transactions: TransactionRepository::new(pool.clone(), writer.clone()),
        entries: EntryRepository::new(pool.clone(), writer.clone()),
        fx: FxRepository::new(pool.clone(), writer),
        pool,
        _dir: dir,
    }
}

impl TestDb {
    pub async fn account(&self, id: &str, account_type: AccountType, currency: &str) -> Account {
        self.accounts
            .create(NewAccount {
                id: Some(id.to_string()),
                name: id.to_string(),
                account_type,
                currency: currency.to_string(),
            })
            .await
            .expect("Failed to create account")
    }

    pub async fn category(&self, id: &str, parent: Option<&str>) -> Category {
        self.categories
            .create(NewCategory {
                id: Some(id.to_string()),
                name: id.to_string(),
                parent_id: parent.map(str::to_string),
            })
            .await
            .expect("Failed to create category")
    }
}

pub fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}
