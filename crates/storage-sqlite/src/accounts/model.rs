//! Database model for accounts.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use ledgerbook_core::accounts::{Account, AccountType, NewAccount};
use ledgerbook_core::errors::Error;

use crate::ledger::parse_amount;

/// Database model for accounts. The balance is stored as decimal text.
#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::accounts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AccountDB {
    pub id: String,
    pub name: String,
    pub account_type: String,
    pub currency: String,
    pub balance: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<AccountDB> for Account {
    type Error = Error;

    fn try_from(db: AccountDB) -> Result<Self, Self::Error> {
        let balance = parse_amount(&format!("account {}", db.id), &db.balance)?;
        Ok(Self {
            account_type: AccountType::from_str(&db.account_type)?,
            id: db.id,
            name: db.name,
            currency: db.currency,
            balance,
            created_at: db.created_at,
            updated_at: db.updated_at,
        })
    }
}

impl From<NewAccount> for AccountDB {
    fn from(domain: NewAccount) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: domain
                .id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            name: domain.name,
            account_type: domain.account_type.as_db_str().to_string(),
            currency: domain.currency,
            balance: Decimal::ZERO.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}
