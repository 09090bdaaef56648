use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use ledgerbook_core::entries::Entry;
use ledgerbook_core::errors::Error;

use crate::ledger::parse_amount;

/// Database model for entries. Amounts are signed decimal text, debits positive.
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
#[diesel(table_name = crate::schema::entries)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct EntryDB {
    pub id: String,
    pub transaction_id: String,
    pub account_id: String,
    pub amount: String,
    pub recorded_at: NaiveDateTime,
    pub reference: Option<String>,
}

impl From<&Entry> for EntryDB {
    fn from(entry: &Entry) -> Self {
        Self {
            id: entry.id.clone(),
            transaction_id: entry.transaction_id.clone(),
            account_id: entry.account_id.clone(),
            amount: entry.amount.to_string(),
            recorded_at: entry.recorded_at,
            reference: entry.reference.clone(),
        }
    }
}

impl TryFrom<EntryDB> for Entry {
    type Error = Error;

    fn try_from(db: EntryDB) -> Result<Self, Self::Error> {
        let amount = parse_amount(&format!("entry {}", db.id), &db.amount)?;
        Ok(Self {
            id: db.id,
            transaction_id: db.transaction_id,
            account_id: db.account_id,
            amount,
            recorded_at: db.recorded_at,
            reference: db.reference,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_corrupt_amount_is_reported() {
        let row = EntryDB {
            id: "e1".to_string(),
            transaction_id: "t1".to_string(),
            account_id: "cash".to_string(),
            amount: "twelve".to_string(),
            recorded_at: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            reference: None,
        };
        assert!(Entry::try_from(row.clone()).is_err());

        let fixed = EntryDB {
            amount: "-12.40".to_string(),
            ..row
        };
        assert_eq!(Entry::try_from(fixed).unwrap().amount, dec!(-12.40));
    }
}
