use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use ledgerbook_core::errors::Result;
use ledgerbook_core::fx::{ExchangeRate, FxRepositoryTrait, NewExchangeRate};

use super::model::ExchangeRateDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::exchange_rates;

#[derive(Clone)]
pub struct FxRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl FxRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

fn collect_rates(rows: Vec<ExchangeRateDB>) -> Result<Vec<ExchangeRate>> {
    rows.into_iter().map(ExchangeRate::try_from).collect()
}

/// Inserts the rate or replaces the one stored for the same pair and day.
/// The stored row keeps its original id.
fn upsert_one(conn: &mut SqliteConnection, rate: NewExchangeRate) -> Result<ExchangeRate> {
    let row = ExchangeRateDB::from(rate);
    diesel::insert_into(exchange_rates::table)
        .values(&row)
        .on_conflict((
            exchange_rates::base_currency,
            exchange_rates::counter_currency,
            exchange_rates::since,
        ))
        .do_update()
        .set(exchange_rates::rate.eq(&row.rate))
        .execute(conn)
        .into_core()?;

    exchange_rates::table
        .filter(exchange_rates::base_currency.eq(&row.base_currency))
        .filter(exchange_rates::counter_currency.eq(&row.counter_currency))
        .filter(exchange_rates::since.eq(row.since))
        .select(ExchangeRateDB::as_select())
        .first::<ExchangeRateDB>(conn)
        .into_core()?
        .try_into()
}

#[async_trait]
impl FxRepositoryTrait for FxRepository {
    async fn upsert_rate(&self, rate: NewExchangeRate) -> Result<ExchangeRate> {
        self.writer.exec(move |conn| upsert_one(conn, rate)).await
    }

    async fn upsert_rates(&self, rates: Vec<NewExchangeRate>) -> Result<Vec<ExchangeRate>> {
        self.writer
            .exec(move |conn| {
                rates
                    .into_iter()
                    .map(|rate| upsert_one(conn, rate))
                    .collect::<Result<Vec<_>>>()
            })
            .await
    }

    async fn delete_rate(&self, rate_id: &str) -> Result<usize> {
        let rate_id = rate_id.to_string();
        self.writer
            .exec(move |conn| {
                diesel::delete(exchange_rates::table.find(&rate_id))
                    .execute(conn)
                    .into_core()
            })
            .await
    }

    fn get_rate_by_id(&self, rate_id: &str) -> Result<Option<ExchangeRate>> {
        let mut conn = get_connection(&self.pool)?;
        exchange_rates::table
            .find(rate_id)
            .select(ExchangeRateDB::as_select())
            .first::<ExchangeRateDB>(&mut conn)
            .optional()
            .into_core()?
            .map(ExchangeRate::try_from)
            .transpose()
    }

    fn list_rates(&self, base: Option<&str>, counter: Option<&str>) -> Result<Vec<ExchangeRate>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = exchange_rates::table.into_boxed();
        if let Some(base) = base {
            query = query.filter(exchange_rates::base_currency.eq(base));
        }
        if let Some(counter) = counter {
            query = query.filter(exchange_rates::counter_currency.eq(counter));
        }
        let rows = query
            .select(ExchangeRateDB::as_select())
            .order((
                exchange_rates::base_currency.asc(),
                exchange_rates::counter_currency.asc(),
                exchange_rates::since.desc(),
            ))
            .load::<ExchangeRateDB>(&mut conn)
            .into_core()?;
        collect_rates(rows)
    }

    fn find_effective_rate(
        &self,
        base: &str,
        counter: &str,
        on: NaiveDate,
    ) -> Result<Option<ExchangeRate>> {
        let mut conn = get_connection(&self.pool)?;
        exchange_rates::table
            .filter(exchange_rates::base_currency.eq(base))
            .filter(exchange_rates::counter_currency.eq(counter))
            .filter(exchange_rates::since.le(on))
            .select(ExchangeRateDB::as_select())
            .order(exchange_rates::since.desc())
            .first::<ExchangeRateDB>(&mut conn)
            .optional()
            .into_core()?
            .map(ExchangeRate::try_from)
            .transpose()
    }

    fn latest_rates(&self) -> Result<Vec<ExchangeRate>> {
        let mut rates = self.list_rates(None, None)?;
        // Newest first within each pair, so the first row of a pair wins.
        rates.dedup_by(|later, first| later.pair() == first.pair());
        Ok(rates)
    }
}
