//! Database model for transactions.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ledgerbook_core::errors::Error;
use ledgerbook_core::transactions::{Transaction, TransactionDraft};

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
#[diesel(table_name = crate::schema::transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TransactionDB {
    pub id: String,
    pub number: i64,
    pub category_id: String,
    pub description: String,
    pub details: Option<String>,
    pub currency: String,
    pub total: String,
    pub incurred_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TransactionDB {
    /// Header row for a draft. The total starts at zero and is raised by the
    /// balance plan once the entries are in place.
    pub fn from_draft(draft: &TransactionDraft, number: i64, now: NaiveDateTime) -> Self {
        Self {
            id: draft.id.clone(),
            number,
            category_id: draft.category_id.clone(),
            description: draft.description.clone(),
            details: draft.details.clone(),
            currency: draft.currency.clone(),
            total: Decimal::ZERO.to_string(),
            incurred_at: draft.incurred_at,
            created_at: now,
            updated_at: now,
        }
    }
}

impl TryFrom<TransactionDB> for Transaction {
    type Error = Error;

    fn try_from(db: TransactionDB) -> Result<Self, Self::Error> {
        let total = parse_amount(&format!("transaction {}", db.id), &db.total)?;
        Ok(Self {
            id: db.id,
            number: db.number,
            category_id: db.category_id,
            description: db.description,
            details: db.details,
            currency: db.currency,
            total,
            incurred_at: db.incurred_at,
            created_at: db.created_at,
            updated_at: db.updated_at,
        })
    }
}
