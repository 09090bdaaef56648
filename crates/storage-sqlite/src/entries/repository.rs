use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use ledgerbook_core::entries::{
    plan_entry_change, Entry, EntryRepositoryTrait, EntryWithTransaction,
};
use ledgerbook_core::errors::{LedgerError, Result};

use super::model::EntryDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::ledger::apply_adjustments;
use crate::schema::{entries, transactions};

pub struct EntryRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl EntryRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

fn collect_entries(rows: Vec<EntryDB>) -> Result<Vec<Entry>> {
    rows.into_iter().map(Entry::try_from).collect()
}

fn load_entry(conn: &mut SqliteConnection, entry_id: &str) -> Result<Entry> {
    entries::table
        .find(entry_id)
        .select(EntryDB::as_select())
        .first::<EntryDB>(conn)
        .optional()
        .into_core()?
        .ok_or_else(|| LedgerError::EntryNotFound(entry_id.to_string()))?
        .try_into()
}

pub(crate) fn load_transaction_entries(
    conn: &mut SqliteConnection,
    transaction_id: &str,
) -> Result<Vec<Entry>> {
    let rows = entries::table
        .filter(entries::transaction_id.eq(transaction_id))
        .select(EntryDB::as_select())
        .order((entries::recorded_at.asc(), entries::id.asc()))
        .load::<EntryDB>(conn)
        .into_core()?;
    collect_entries(rows)
}

#[async_trait]
impl EntryRepositoryTrait for EntryRepository {
    async fn insert(&self, entry: Entry) -> Result<Entry> {
        self.writer
            .exec(move |conn| {
                let exists = transactions::table
                    .find(&entry.transaction_id)
                    .count()
                    .get_result::<i64>(conn)
                    .into_core()?;
                if exists == 0 {
                    return Err(
                        LedgerError::TransactionNotFound(entry.transaction_id.clone()).into(),
                    );
                }
                diesel::insert_into(entries::table)
                    .values(EntryDB::from(&entry))
                    .execute(conn)
                    .into_core()?;
                apply_adjustments(conn, &plan_entry_change(None, Some(&entry)))?;
                Ok(entry)
            })
            .await
    }

    async fn update(&self, entry: Entry) -> Result<Entry> {
        self.writer
            .exec(move |conn| {
                let old = load_entry(conn, &entry.id)?;
                diesel::update(entries::table.find(&entry.id))
                    .set((
                        entries::account_id.eq(&entry.account_id),
                        entries::amount.eq(entry.amount.to_string()),
                        entries::recorded_at.eq(entry.recorded_at),
                        entries::reference.eq(&entry.reference),
                    ))
                    .execute(conn)
                    .into_core()?;
                apply_adjustments(conn, &plan_entry_change(Some(&old), Some(&entry)))?;
                Ok(entry)
            })
            .await
    }

    async fn delete(&self, entry_id: &str) -> Result<Entry> {
        let entry_id = entry_id.to_string();
        self.writer
            .exec(move |conn| {
                let old = load_entry(conn, &entry_id)?;
                diesel::delete(entries::table.find(&entry_id))
                    .execute(conn)
                    .into_core()?;
                apply_adjustments(conn, &plan_entry_change(Some(&old), None))?;
                Ok(old)
            })
            .await
    }

    fn get_by_id(&self, entry_id: &str) -> Result<Entry> {
        let mut conn = get_connection(&self.pool)?;
        entries::table
            .find(entry_id)
            .select(EntryDB::as_select())
            .first::<EntryDB>(&mut conn)
            .into_core()?
            .try_into()
    }

    fn list_for_transaction(&self, transaction_id: &str) -> Result<Vec<Entry>> {
        let mut conn = get_connection(&self.pool)?;
        load_transaction_entries(&mut conn, transaction_id)
    }

    fn list_for_account(&self, account_id: &str) -> Result<Vec<EntryWithTransaction>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = entries::table
            .inner_join(transactions::table)
            .filter(entries::account_id.eq(account_id))
            .select((
                EntryDB::as_select(),
                transactions::number,
                transactions::description,
                transactions::category_id,
            ))
            .load::<(EntryDB, i64, String, String)>(&mut conn)
            .into_core()?;

        rows.into_iter()
            .map(|(entry, transaction_number, description, category_id)| {
                Ok(EntryWithTransaction {
                    entry: entry.try_into()?,
                    transaction_number,
                    description,
                    category_id,
                })
            })
            .collect()
    }

    fn list_all(&self) -> Result<Vec<Entry>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = entries::table
            .select(EntryDB::as_select())
            .order((entries::transaction_id.asc(), entries::recorded_at.asc()))
            .load::<EntryDB>(&mut conn)
            .into_core()?;
        collect_entries(rows)
    }
}
