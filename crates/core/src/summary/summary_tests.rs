use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::summary_model::*;
use crate::accounts::{Account, AccountType};
use crate::categories::Category;
use crate::errors::Result;
use crate::fx::FxError;
use crate::transactions::Transaction;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    day(y, m, d).and_hms_opt(10, 0, 0).unwrap()
}

/// EUR converts at 2, USD is the reporting currency, anything else has no rate.
fn convert(amount: Decimal, currency: &str, on: NaiveDate) -> Result<Decimal> {
    match currency {
        "USD" => Ok(amount),
        "EUR" => Ok(amount * dec!(2)),
        other => Err(FxError::RateNotFound {
            base: other.to_string(),
            counter: "USD".to_string(),
            date: on,
        }
        .into()),
    }
}

fn account(id: &str, account_type: AccountType, currency: &str, balance: Decimal) -> Account {
    Account {
        id: id.to_string(),
        name: id.to_string(),
        account_type,
        currency: currency.to_string(),
        balance,
        created_at: at(2024, 1, 1),
        updated_at: at(2024, 1, 1),
    }
}

fn category(id: &str, name: &str, parent: Option<&str>) -> Category {
    Category {
        id: id.to_string(),
        name: name.to_string(),
        parent_id: parent.map(str::to_string),
        created_at: at(2024, 1, 1),
        updated_at: at(2024, 1, 1),
    }
}

fn transaction(
    id: &str,
    category: &str,
    currency: &str,
    total: Decimal,
    when: NaiveDateTime,
) -> Transaction {
    Transaction {
        id: id.to_string(),
        number: 1,
        category_id: category.to_string(),
        description: id.to_string(),
        details: None,
        currency: currency.to_string(),
        total,
        incurred_at: when,
        created_at: when,
        updated_at: when,
    }
}

#[test]
fn test_balance_sheet_uses_natural_balances() {
    let accounts = vec![
        account("wallet", AccountType::Cash, "USD", dec!(100)),
        account("savings", AccountType::Cash, "EUR", dec!(50)),
        account("card", AccountType::Payable, "USD", dec!(-30)),
        account("yen", AccountType::Cash, "JPY", dec!(1000)),
    ];

    let sheet = summarize_balances(accounts, "USD", day(2024, 6, 1), convert).unwrap();

    assert_eq!(sheet.accounts[2].natural_balance, dec!(30));
    assert_eq!(sheet.accounts[1].converted_balance, Some(dec!(100)));
    assert_eq!(sheet.unconverted, vec!["yen"]);

    let cash_usd = sheet
        .totals
        .iter()
        .find(|t| t.account_type == AccountType::Cash && t.currency == "USD")
        .unwrap();
    assert_eq!(cash_usd.amount, dec!(100));
    assert_eq!(sheet.totals.len(), 4);

    let converted_cash = sheet
        .converted_totals
        .iter()
        .find(|t| t.account_type == AccountType::Cash)
        .unwrap();
    assert_eq!(converted_cash.amount, dec!(200));
}

#[test]
fn test_balance_sheet_propagates_unexpected_errors() {
    let accounts = vec![account("wallet", AccountType::Cash, "EUR", dec!(1))];
    let result = summarize_balances(accounts, "USD", day(2024, 6, 1), |_, _, _| {
        Err(crate::Error::Unexpected("db gone".to_string()))
    });
    assert!(result.is_err());
}

#[test]
fn test_category_summary_rolls_children_into_parent() {
    let categories = vec![
        category("food", "Food", None),
        category("groceries", "Groceries", Some("food")),
        category("travel", "Travel", None),
    ];
    let transactions = vec![
        transaction("t1", "groceries", "USD", dec!(-20), at(2024, 2, 3)),
        transaction("t2", "food", "EUR", dec!(-15), at(2024, 2, 4)),
        transaction("t3", "travel", "USD", dec!(-40), at(2024, 2, 5)),
        transaction("t4", "travel", "JPY", dec!(-900), at(2024, 2, 5)),
    ];

    let (totals, unconverted) =
        summarize_by_category(&transactions, &categories, convert).unwrap();

    assert_eq!(unconverted, vec!["t4"]);
    assert_eq!(totals.len(), 2);
    assert_eq!(totals[0].category_id, "food");
    assert_eq!(totals[0].amount, dec!(-50));
    assert_eq!(totals[0].transaction_count, 2);
    assert_eq!(totals[1].category_name, "Travel");
}

#[test]
fn test_monthly_totals_are_chronological() {
    let transactions = vec![
        transaction("t1", "food", "USD", dec!(10), at(2024, 3, 31)),
        transaction("t2", "food", "USD", dec!(5), at(2024, 1, 2)),
        transaction("t3", "food", "EUR", dec!(1), at(2024, 3, 1)),
    ];

    let (months, unconverted) = summarize_by_month(&transactions, convert).unwrap();

    assert!(unconverted.is_empty());
    assert_eq!(
        months,
        vec![
            MonthlyTotal {
                year: 2024,
                month: 1,
                amount: dec!(5),
                transaction_count: 1
            },
            MonthlyTotal {
                year: 2024,
                month: 3,
                amount: dec!(12),
                transaction_count: 2
            },
        ]
    );
}
