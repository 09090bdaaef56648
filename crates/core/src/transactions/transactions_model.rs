//! Transaction domain models.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entries::{Entry, NewEntry};
use crate::errors::{Error, Result, ValidationError};
use crate::fx::normalize_currency_code;

/// A named, dated grouping of entries. `total` is the sum of the entry amounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    /// Timestamp-derived, strictly increasing across transactions.
    pub number: i64,
    pub category_id: String,
    pub description: String,
    pub details: Option<String>,
    pub currency: String,
    pub total: Decimal,
    pub incurred_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Transaction form as submitted by the user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub id: Option<String>,
    pub category_id: Option<String>,
    pub description: String,
    pub details: Option<String>,
    pub currency: Option<String>,
    pub incurred_at: NaiveDateTime,
    pub entries: Vec<NewEntry>,
}

impl NewTransaction {
    /// Checks the header fields and returns the normalized currency.
    ///
    /// Entry drafts are checked separately so all of their problems can be
    /// reported together.
    pub fn validate_header(&self) -> Result<String> {
        if self.description.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "description".to_string(),
            )));
        }
        if self
            .category_id
            .as_deref()
            .map_or(true, |c| c.trim().is_empty())
        {
            return Err(Error::Validation(ValidationError::MissingField(
                "category".to_string(),
            )));
        }
        let currency = match self.currency.as_deref().map(str::trim) {
            None | Some("") => {
                return Err(Error::Validation(ValidationError::MissingField(
                    "currency".to_string(),
                )))
            }
            Some(code) => normalize_currency_code(code)?,
        };
        if self.entries.is_empty() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "A transaction needs at least one entry".to_string(),
            )));
        }
        Ok(currency)
    }
}

/// A validated transaction with its entries, ready to be written.
///
/// The repository assigns the number and writes the total from the entries.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionDraft {
    pub id: String,
    pub category_id: String,
    pub description: String,
    pub details: Option<String>,
    pub currency: String,
    pub incurred_at: NaiveDateTime,
    pub entries: Vec<Entry>,
}

impl TransactionDraft {
    pub fn total(&self) -> Decimal {
        self.entries.iter().map(|e| e.amount).sum()
    }
}

/// Header changes for an existing transaction. Entries are edited one by one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionUpdate {
    pub id: String,
    pub category_id: String,
    pub description: String,
    pub details: Option<String>,
    /// New currency; rejected while entries exist in another currency.
    pub currency: Option<String>,
    pub incurred_at: NaiveDateTime,
}

impl TransactionUpdate {
    pub fn validate(&self) -> Result<()> {
        if self.description.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "description".to_string(),
            )));
        }
        if self.category_id.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "category".to_string(),
            )));
        }
        if let Some(currency) = &self.currency {
            normalize_currency_code(currency)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDetails {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub entries: Vec<Entry>,
}

impl TransactionDetails {
    pub fn account_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.iter().map(|e| e.account_id.clone()).collect();
        ids.sort();
        ids.dedup();
        ids
    }
}

/// Filters for searching transactions. Unset fields do not filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionQuery {
    /// Matches the category and, for a top-level category, its children.
    pub category_id: Option<String>,
    /// Matches transactions with at least one entry on the account.
    pub account_id: Option<String>,
    pub incurred_from: Option<NaiveDateTime>,
    /// Exclusive upper bound.
    pub incurred_to: Option<NaiveDateTime>,
    /// Case-insensitive substring of the description.
    pub keyword: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPage {
    pub data: Vec<Transaction>,
    pub total_row_count: i64,
    pub page: i64,
    pub page_size: i64,
}

/// Number for a transaction created at `now_millis` (epoch milliseconds),
/// given the highest number already in use.
pub fn next_transaction_number(now_millis: i64, last: Option<i64>) -> i64 {
    match last {
        Some(last) if now_millis <= last => last + 1,
        _ => now_millis,
    }
}

pub(crate) fn clean_details(details: Option<String>) -> Option<String> {
    details
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}
