//! Account domain models.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ValidationError;
use crate::fx::normalize_currency_code;
use crate::{Error, Result};

/// Which side of the ledger increases an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Polarity {
    Debit,
    Credit,
}

impl Polarity {
    /// Multiplier that turns a debit-positive balance into the natural reading.
    pub fn sign(&self) -> Decimal {
        match self {
            Polarity::Debit => Decimal::ONE,
            Polarity::Credit => Decimal::NEGATIVE_ONE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    Cash,
    Receivable,
    Payable,
    Expense,
    Income,
}

impl AccountType {
    pub const ALL: [AccountType; 5] = [
        AccountType::Cash,
        AccountType::Receivable,
        AccountType::Payable,
        AccountType::Expense,
        AccountType::Income,
    ];

    /// Cash, receivables and expenses grow with debits; payables and income with credits.
    pub fn polarity(&self) -> Polarity {
        match self {
            AccountType::Cash | AccountType::Receivable | AccountType::Expense => Polarity::Debit,
            AccountType::Payable | AccountType::Income => Polarity::Credit,
        }
    }

    pub fn as_db_str(&self) -> &'static str {
        match self {
            AccountType::Cash => "CASH",
            AccountType::Receivable => "RECEIVABLE",
            AccountType::Payable => "PAYABLE",
            AccountType::Expense => "EXPENSE",
            AccountType::Income => "INCOME",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_db_str())
    }
}

impl FromStr for AccountType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        AccountType::ALL
            .into_iter()
            .find(|t| t.as_db_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                Error::Validation(ValidationError::InvalidInput(format!(
                    "Unknown account type '{}'",
                    s
                )))
            })
    }
}

/// Domain model representing an account in the system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub name: String,
    pub account_type: AccountType,
    pub currency: String,
    /// Sum of entry amounts, debits positive. Maintained from entries.
    pub balance: Decimal,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Account {
    /// Balance as the owner reads it: positive when the account holds its
    /// normal side (money in cash, money owed on a payable, income earned).
    pub fn natural_balance(&self) -> Decimal {
        self.balance * self.account_type.polarity().sign()
    }
}

/// Input model for creating a new account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub account_type: AccountType,
    pub currency: String,
}

impl NewAccount {
    /// Validates the new account data.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Account name cannot be empty".to_string(),
            )));
        }
        normalize_currency_code(&self.currency)?;
        Ok(())
    }

    /// Returns a validated copy with trimmed name and normalized currency.
    pub fn normalized(self) -> Result<Self> {
        self.validate()?;
        Ok(Self {
            id: self.id,
            name: self.name.trim().to_string(),
            account_type: self.account_type,
            currency: normalize_currency_code(&self.currency)?,
        })
    }
}

/// Input model for updating an existing account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountUpdate {
    pub id: Option<String>,
    pub name: String,
    pub account_type: AccountType,
    /// New currency; only accepted while the account has no entries.
    pub currency: Option<String>,
}

impl AccountUpdate {
    /// Validates the account update data.
    pub fn validate(&self) -> Result<()> {
        if self.id.is_none() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Account ID is required for updates".to_string(),
            )));
        }
        if self.name.trim().is_empty() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Account name cannot be empty".to_string(),
            )));
        }
        if let Some(currency) = &self.currency {
            normalize_currency_code(currency)?;
        }
        Ok(())
    }
}

/// Optional filters for listing accounts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountFilter {
    pub account_type: Option<AccountType>,
    pub currency: Option<String>,
}
