//! Summary models and the aggregation behind them.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::accounts::{Account, AccountType};
use crate::categories::Category;
use crate::constants::DISPLAY_DECIMAL_PRECISION;
use crate::errors::{Error, Result};
use crate::fx::FxError;
use crate::transactions::Transaction;

/// Half-open `[from, to)` range over `incurred_at`; `None` leaves a side open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub from: Option<NaiveDateTime>,
    pub to: Option<NaiveDateTime>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDateTime>, to: Option<NaiveDateTime>) -> Self {
        Self { from, to }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountBalance {
    pub account: Account,
    pub natural_balance: Decimal,
    /// Natural balance in the reporting currency, when a rate was found.
    pub converted_balance: Option<Decimal>,
}

/// Natural balances of one account type in one account currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeTotal {
    pub account_type: AccountType,
    pub currency: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertedTypeTotal {
    pub account_type: AccountType,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSheet {
    pub reporting_currency: String,
    pub as_of: NaiveDate,
    pub accounts: Vec<AccountBalance>,
    pub totals: Vec<TypeTotal>,
    pub converted_totals: Vec<ConvertedTypeTotal>,
    /// Accounts left out of `converted_totals` for lack of a rate.
    pub unconverted: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category_id: String,
    pub category_name: String,
    pub amount: Decimal,
    pub transaction_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub reporting_currency: String,
    pub range: DateRange,
    pub totals: Vec<CategoryTotal>,
    /// Transactions left out for lack of a rate on their date.
    pub unconverted: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTotal {
    pub year: i32,
    pub month: u32,
    pub amount: Decimal,
    pub transaction_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    pub reporting_currency: String,
    pub range: DateRange,
    pub months: Vec<MonthlyTotal>,
    pub unconverted: Vec<String>,
}

/// Converts `amount` from `currency` on `on`; `Ok(None)` when no rate exists.
pub(crate) fn try_convert<F>(
    convert: &F,
    amount: Decimal,
    currency: &str,
    on: NaiveDate,
) -> Result<Option<Decimal>>
where
    F: Fn(Decimal, &str, NaiveDate) -> Result<Decimal>,
{
    match convert(amount, currency, on) {
        Ok(value) => Ok(Some(value.round_dp(DISPLAY_DECIMAL_PRECISION))),
        Err(Error::Fx(FxError::RateNotFound { .. })) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Builds the balance sheet from accounts, converting with `convert`.
pub fn summarize_balances<F>(
    accounts: Vec<Account>,
    reporting_currency: &str,
    as_of: NaiveDate,
    convert: F,
) -> Result<BalanceSheet>
where
    F: Fn(Decimal, &str, NaiveDate) -> Result<Decimal>,
{
    let mut totals: BTreeMap<(AccountType, String), Decimal> = BTreeMap::new();
    let mut converted_totals: BTreeMap<AccountType, Decimal> = BTreeMap::new();
    let mut unconverted = Vec::new();
    let mut rows = Vec::with_capacity(accounts.len());

    for account in accounts {
        let natural = account.natural_balance();
        *totals
            .entry((account.account_type, account.currency.clone()))
            .or_default() += natural;

        let converted = try_convert(&convert, natural, &account.currency, as_of)?;
        match converted {
            Some(value) => *converted_totals.entry(account.account_type).or_default() += value,
            None => unconverted.push(account.id.clone()),
        }
        rows.push(AccountBalance {
            account,
            natural_balance: natural,
            converted_balance: converted,
        });
    }

    Ok(BalanceSheet {
        reporting_currency: reporting_currency.to_string(),
        as_of,
        accounts: rows,
        totals: totals
            .into_iter()
            .map(|((account_type, currency), amount)| TypeTotal {
                account_type,
                currency,
                amount,
            })
            .collect(),
        converted_totals: converted_totals
            .into_iter()
            .map(|(account_type, amount)| ConvertedTypeTotal {
                account_type,
                amount,
            })
            .collect(),
        unconverted,
    })
}

/// Groups transaction totals by top-level category, largest magnitude first.
pub fn summarize_by_category<F>(
    transactions: &[Transaction],
    categories: &[Category],
    convert: F,
) -> Result<(Vec<CategoryTotal>, Vec<String>)>
where
    F: Fn(Decimal, &str, NaiveDate) -> Result<Decimal>,
{
    let by_id: HashMap<&str, &Category> = categories.iter().map(|c| (c.id.as_str(), c)).collect();
    let mut grouped: HashMap<String, (Decimal, i64)> = HashMap::new();
    let mut unconverted = Vec::new();

    for transaction in transactions {
        let Some(amount) = try_convert(
            &convert,
            transaction.total,
            &transaction.currency,
            transaction.incurred_at.date(),
        )?
        else {
            unconverted.push(transaction.id.clone());
            continue;
        };
        let root = by_id
            .get(transaction.category_id.as_str())
            .map(|c| c.root_id().to_string())
            .unwrap_or_else(|| transaction.category_id.clone());
        let slot = grouped.entry(root).or_default();
        slot.0 += amount;
        slot.1 += 1;
    }

    let mut totals: Vec<CategoryTotal> = grouped
        .into_iter()
        .map(|(category_id, (amount, transaction_count))| CategoryTotal {
            category_name: by_id
                .get(category_id.as_str())
                .map(|c| c.name.clone())
                .unwrap_or_else(|| category_id.clone()),
            category_id,
            amount,
            transaction_count,
        })
        .collect();
    totals.sort_by(|a, b| {
        b.amount
            .abs()
            .cmp(&a.amount.abs())
            .then_with(|| a.category_name.cmp(&b.category_name))
    });

    Ok((totals, unconverted))
}

/// Sums transaction totals per calendar month, oldest month first.
pub fn summarize_by_month<F>(
    transactions: &[Transaction],
    convert: F,
) -> Result<(Vec<MonthlyTotal>, Vec<String>)>
where
    F: Fn(Decimal, &str, NaiveDate) -> Result<Decimal>,
{
    let mut months: BTreeMap<(i32, u32), (Decimal, i64)> = BTreeMap::new();
    let mut unconverted = Vec::new();

    for transaction in transactions {
        let date = transaction.incurred_at.date();
        match try_convert(&convert, transaction.total, &transaction.currency, date)? {
            Some(amount) => {
                let slot = months.entry((date.year(), date.month())).or_default();
                slot.0 += amount;
                slot.1 += 1;
            }
            None => unconverted.push(transaction.id.clone()),
        }
    }

    let months = months
        .into_iter()
        .map(|((year, month), (amount, transaction_count))| MonthlyTotal {
            year,
            month,
            amount,
            transaction_count,
        })
        .collect();
    Ok((months, unconverted))
}
