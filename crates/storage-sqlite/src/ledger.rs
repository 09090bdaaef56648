//! Applies balance plans to the cached account balances and transaction totals.
//!
//! Every function here takes the writer's connection, so the cache update
//! commits or rolls back together with the row change that produced the plan.

use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use rust_decimal::Decimal;
use std::str::FromStr;

use ledgerbook_core::entries::BalanceAdjustment;
use ledgerbook_core::errors::{LedgerError, Result};

use crate::errors::IntoCore;
use crate::schema::{accounts, entries, transactions};

/// Parses a stored decimal, naming the record when the text is unreadable.
pub(crate) fn parse_amount(record: &str, value: &str) -> Result<Decimal> {
    Decimal::from_str(value.trim()).map_err(|_| {
        LedgerError::CorruptAmount {
            record: record.to_string(),
            value: value.to_string(),
        }
        .into()
    })
}

pub(crate) fn apply_adjustments(
    conn: &mut SqliteConnection,
    plan: &[BalanceAdjustment],
) -> Result<()> {
    for adjustment in plan {
        match adjustment {
            BalanceAdjustment::Account { account_id, delta } => {
                let current = stored_balance(conn, account_id)?;
                write_balance(conn, account_id, current + *delta)?;
            }
            BalanceAdjustment::TransactionTotal {
                transaction_id,
                delta,
            } => {
                let current = stored_total(conn, transaction_id)?;
                write_total(conn, transaction_id, current + *delta)?;
            }
            BalanceAdjustment::Recompute { account_id } => {
                let sum = account_entry_sum(conn, account_id)?;
                write_balance(conn, account_id, sum)?;
            }
        }
    }
    Ok(())
}

fn stored_balance(conn: &mut SqliteConnection, account_id: &str) -> Result<Decimal> {
    let balance = accounts::table
        .find(account_id)
        .select(accounts::balance)
        .first::<String>(conn)
        .optional()
        .into_core()?
        .ok_or_else(|| LedgerError::AccountNotFound(account_id.to_string()))?;
    parse_amount(&format!("account {}", account_id), &balance)
}

fn stored_total(conn: &mut SqliteConnection, transaction_id: &str) -> Result<Decimal> {
    let total = transactions::table
        .find(transaction_id)
        .select(transactions::total)
        .first::<String>(conn)
        .optional()
        .into_core()?
        .ok_or_else(|| LedgerError::TransactionNotFound(transaction_id.to_string()))?;
    parse_amount(&format!("transaction {}", transaction_id), &total)
}

pub(crate) fn write_balance(
    conn: &mut SqliteConnection,
    account_id: &str,
    balance: Decimal,
) -> Result<()> {
    let updated = diesel::update(accounts::table.find(account_id))
        .set((
            accounts::balance.eq(balance.to_string()),
            accounts::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(conn)
        .into_core()?;
    if updated == 0 {
        return Err(LedgerError::AccountNotFound(account_id.to_string()).into());
    }
    Ok(())
}

pub(crate) fn write_total(
    conn: &mut SqliteConnection,
    transaction_id: &str,
    total: Decimal,
) -> Result<()> {
    let updated = diesel::update(transactions::table.find(transaction_id))
        .set(transactions::total.eq(total.to_string()))
        .execute(conn)
        .into_core()?;
    if updated == 0 {
        return Err(LedgerError::TransactionNotFound(transaction_id.to_string()).into());
    }
    Ok(())
}

pub(crate) fn account_entry_sum(conn: &mut SqliteConnection, account_id: &str) -> Result<Decimal> {
    let rows = entries::table
        .filter(entries::account_id.eq(account_id))
        .select((entries::id, entries::amount))
        .load::<(String, String)>(conn)
        .into_core()?;
    sum_rows(rows)
}

pub(crate) fn transaction_entry_sum(
    conn: &mut SqliteConnection,
    transaction_id: &str,
) -> Result<Decimal> {
    let rows = entries::table
        .filter(entries::transaction_id.eq(transaction_id))
        .select((entries::id, entries::amount))
        .load::<(String, String)>(conn)
        .into_core()?;
    sum_rows(rows)
}

fn sum_rows(rows: Vec<(String, String)>) -> Result<Decimal> {
    rows.iter().try_fold(Decimal::ZERO, |sum, (id, amount)| {
        Ok(sum + parse_amount(&format!("entry {}", id), amount)?)
    })
}
