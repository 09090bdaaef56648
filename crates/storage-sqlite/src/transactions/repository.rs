use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::sqlite::{Sqlite, SqliteConnection};
use log::debug;
use std::sync::Arc;

use ledgerbook_core::entries::{plan_transaction_creation, plan_transaction_removal, Entry};
use ledgerbook_core::errors::{Error, LedgerError, Result};
use ledgerbook_core::paging::page_offset;
use ledgerbook_core::transactions::{
    next_transaction_number, Transaction, TransactionDetails, TransactionDraft, TransactionPage,
    TransactionQuery, TransactionRepositoryTrait, TransactionUpdate,
};

use super::model::TransactionDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::entries::{load_transaction_entries, EntryDB};
use crate::errors::IntoCore;
use crate::ledger::{apply_adjustments, transaction_entry_sum, write_total};
use crate::schema::{accounts, categories, entries, transactions};

pub struct TransactionRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl TransactionRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

pub(crate) fn load_transaction(
    conn: &mut SqliteConnection,
    transaction_id: &str,
) -> Result<Transaction> {
    transactions::table
        .find(transaction_id)
        .select(TransactionDB::as_select())
        .first::<TransactionDB>(conn)
        .optional()
        .into_core()?
        .ok_or_else(|| LedgerError::TransactionNotFound(transaction_id.to_string()))?
        .try_into()
}

fn collect_transactions(rows: Vec<TransactionDB>) -> Result<Vec<Transaction>> {
    rows.into_iter().map(Transaction::try_from).collect()
}

/// `%` and `_` in a keyword match literally.
fn like_pattern(keyword: &str) -> String {
    let escaped = keyword
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait]
impl TransactionRepositoryTrait for TransactionRepository {
    async fn create(&self, draft: TransactionDraft) -> Result<TransactionDetails> {
        self.writer
            .exec(move |conn| {
                let last = transactions::table
                    .select(diesel::dsl::max(transactions::number))
                    .first::<Option<i64>>(conn)
                    .into_core()?;
                let number = next_transaction_number(Utc::now().timestamp_millis(), last);

                let header = TransactionDB::from_draft(&draft, number, Utc::now().naive_utc());
                diesel::insert_into(transactions::table)
                    .values(&header)
                    .execute(conn)
                    .into_core()?;

                let rows: Vec<EntryDB> = draft.entries.iter().map(EntryDB::from).collect();
                if !rows.is_empty() {
                    diesel::insert_into(entries::table)
                        .values(&rows)
                        .execute(conn)
                        .into_core()?;
                }

                apply_adjustments(conn, &plan_transaction_creation(&draft.entries))?;
                debug!(
                    "Booked transaction #{} with {} entries",
                    number,
                    draft.entries.len()
                );

                Ok(TransactionDetails {
                    transaction: load_transaction(conn, &draft.id)?,
                    entries: draft.entries,
                })
            })
            .await
    }

    async fn update(&self, update: TransactionUpdate) -> Result<Transaction> {
        self.writer
            .exec(move |conn| {
                let existing = load_transaction(conn, &update.id)?;

                let currency = match update.currency {
                    Some(currency) if currency != existing.currency => {
                        let foreign = entries::table
                            .inner_join(accounts::table)
                            .filter(entries::transaction_id.eq(&update.id))
                            .filter(accounts::currency.ne(&currency))
                            .count()
                            .get_result::<i64>(conn)
                            .into_core()?;
                        if foreign > 0 {
                            return Err(Error::ConstraintViolation(format!(
                                "Transaction #{} has entries on accounts not held in {}",
                                existing.number, currency
                            )));
                        }
                        currency
                    }
                    _ => existing.currency,
                };

                diesel::update(transactions::table.find(&update.id))
                    .set((
                        transactions::category_id.eq(&update.category_id),
                        transactions::description.eq(&update.description),
                        transactions::details.eq(&update.details),
                        transactions::currency.eq(&currency),
                        transactions::incurred_at.eq(update.incurred_at),
                        transactions::updated_at.eq(Utc::now().naive_utc()),
                    ))
                    .execute(conn)
                    .into_core()?;

                load_transaction(conn, &update.id)
            })
            .await
    }

    async fn delete(&self, transaction_id: &str) -> Result<TransactionDetails> {
        let transaction_id = transaction_id.to_string();
        self.writer
            .exec(move |conn| {
                let transaction = load_transaction(conn, &transaction_id)?;
                let booked: Vec<Entry> = load_transaction_entries(conn, &transaction_id)?;

                apply_adjustments(conn, &plan_transaction_removal(&booked))?;
                diesel::delete(entries::table.filter(entries::transaction_id.eq(&transaction_id)))
                    .execute(conn)
                    .into_core()?;
                diesel::delete(transactions::table.find(&transaction_id))
                    .execute(conn)
                    .into_core()?;

                Ok(TransactionDetails {
                    transaction,
                    entries: booked,
                })
            })
            .await
    }

    async fn recalculate_total(&self, transaction_id: &str) -> Result<Transaction> {
        let transaction_id = transaction_id.to_string();
        self.writer
            .exec(move |conn| {
                let total = transaction_entry_sum(conn, &transaction_id)?;
                write_total(conn, &transaction_id, total)?;
                load_transaction(conn, &transaction_id)
            })
            .await
    }

    fn get_by_id(&self, transaction_id: &str) -> Result<Transaction> {
        let mut conn = get_connection(&self.pool)?;
        transactions::table
            .find(transaction_id)
            .select(TransactionDB::as_select())
            .first::<TransactionDB>(&mut conn)
            .into_core()?
            .try_into()
    }

    fn get_details(&self, transaction_id: &str) -> Result<TransactionDetails> {
        let mut conn = get_connection(&self.pool)?;
        let transaction: Transaction = transactions::table
            .find(transaction_id)
            .select(TransactionDB::as_select())
            .first::<TransactionDB>(&mut conn)
            .into_core()?
            .try_into()?;
        let entries = load_transaction_entries(&mut conn, transaction_id)?;
        Ok(TransactionDetails {
            transaction,
            entries,
        })
    }

    fn search(
        &self,
        query: &TransactionQuery,
        page: i64,
        page_size: i64,
    ) -> Result<TransactionPage> {
        let mut conn = get_connection(&self.pool)?;

        let create_base_query = || {
            let mut boxed: transactions::BoxedQuery<'_, Sqlite> =
                transactions::table.into_boxed();

            if let Some(category_id) = query.category_id.as_deref() {
                // A parent category also matches its subcategories.
                let children = categories::table
                    .filter(categories::parent_id.eq(category_id))
                    .select(categories::id);
                boxed = boxed.filter(
                    transactions::category_id
                        .eq(category_id)
                        .or(transactions::category_id.eq_any(children)),
                );
            }
            if let Some(account_id) = query.account_id.as_deref() {
                let touching = entries::table
                    .filter(entries::account_id.eq(account_id))
                    .select(entries::transaction_id);
                boxed = boxed.filter(transactions::id.eq_any(touching));
            }
            if let Some(from) = query.incurred_from {
                boxed = boxed.filter(transactions::incurred_at.ge(from));
            }
            if let Some(to) = query.incurred_to {
                boxed = boxed.filter(transactions::incurred_at.lt(to));
            }
            if let Some(keyword) = query.keyword.as_deref() {
                boxed = boxed.filter(
                    transactions::description
                        .like(like_pattern(keyword))
                        .escape('\\'),
                );
            }
            boxed
        };

        let total_row_count = create_base_query()
            .count()
            .get_result::<i64>(&mut conn)
            .into_core()?;

        let rows = create_base_query()
            .select(TransactionDB::as_select())
            .order((transactions::incurred_at.desc(), transactions::number.desc()))
            .limit(page_size)
            .offset(page_offset(page, page_size))
            .load::<TransactionDB>(&mut conn)
            .into_core()?;

        Ok(TransactionPage {
            data: collect_transactions(rows)?,
            total_row_count,
            page,
            page_size,
        })
    }

    fn list_in_range(
        &self,
        from: Option<NaiveDateTime>,
        to: Option<NaiveDateTime>,
    ) -> Result<Vec<Transaction>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = transactions::table.into_boxed();
        if let Some(from) = from {
            query = query.filter(transactions::incurred_at.ge(from));
        }
        if let Some(to) = to {
            query = query.filter(transactions::incurred_at.lt(to));
        }
        let rows = query
            .select(TransactionDB::as_select())
            .order((transactions::incurred_at.asc(), transactions::number.asc()))
            .load::<TransactionDB>(&mut conn)
            .into_core()?;
        collect_transactions(rows)
    }
}
