use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use ledgerbook_core::errors::Error;
use ledgerbook_core::fx::{ExchangeRate, NewExchangeRate};

use crate::ledger::parse_amount;

#[derive(
    Queryable,
    Identifiable,
    Insertable,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::exchange_rates)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ExchangeRateDB {
    pub id: String,
    pub base_currency: String,
    pub counter_currency: String,
    pub rate: String,
    pub since: NaiveDate,
    pub created_at: NaiveDateTime,
}

impl From<NewExchangeRate> for ExchangeRateDB {
    fn from(domain: NewExchangeRate) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            base_currency: domain.base_currency,
            counter_currency: domain.counter_currency,
            rate: domain.rate.to_string(),
            since: domain.since,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}

impl TryFrom<ExchangeRateDB> for ExchangeRate {
    type Error = Error;

    fn try_from(db: ExchangeRateDB) -> Result<Self, Self::Error> {
        let rate = parse_amount(&format!("exchange rate {}", db.id), &db.rate)?;
        Ok(Self {
            id: db.id,
            base_currency: db.base_currency,
            counter_currency: db.counter_currency,
            rate,
            since: db.since,
        })
    }
}
