//! Ledger consistency models.
//!
//! Stored balances and totals are caches over the entries. The checks here
//! recompute them and report every place the cache has drifted:
//! - an account's balance equals the signed sum of its entries
//! - the sum of a transaction's entry amounts equals its stored total

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::accounts::Account;
use crate::entries::Entry;
use crate::transactions::Transaction;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountMismatch {
    pub account_id: String,
    pub account_name: String,
    pub stored_balance: Decimal,
    pub computed_balance: Decimal,
}

impl AccountMismatch {
    pub fn difference(&self) -> Decimal {
        self.stored_balance - self.computed_balance
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMismatch {
    pub transaction_id: String,
    pub number: i64,
    pub stored_total: Decimal,
    pub computed_total: Decimal,
}

impl TransactionMismatch {
    pub fn difference(&self) -> Decimal {
        self.stored_total - self.computed_total
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsistencyReport {
    pub checked_at: NaiveDateTime,
    pub accounts_checked: usize,
    pub transactions_checked: usize,
    pub account_mismatches: Vec<AccountMismatch>,
    pub transaction_mismatches: Vec<TransactionMismatch>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.account_mismatches.is_empty() && self.transaction_mismatches.is_empty()
    }

    pub fn issue_count(&self) -> usize {
        self.account_mismatches.len() + self.transaction_mismatches.len()
    }
}

/// Compares stored balances and totals with the sums of `entries`.
pub fn find_mismatches(
    accounts: &[Account],
    transactions: &[Transaction],
    entries: &[Entry],
    checked_at: NaiveDateTime,
) -> ConsistencyReport {
    let mut by_account: HashMap<&str, Decimal> = HashMap::new();
    let mut by_transaction: HashMap<&str, Decimal> = HashMap::new();
    for entry in entries {
        *by_account.entry(entry.account_id.as_str()).or_default() += entry.amount;
        *by_transaction
            .entry(entry.transaction_id.as_str())
            .or_default() += entry.amount;
    }

    let account_mismatches = accounts
        .iter()
        .filter_map(|account| {
            let computed = by_account
                .get(account.id.as_str())
                .copied()
                .unwrap_or_default();
            (computed != account.balance).then(|| AccountMismatch {
                account_id: account.id.clone(),
                account_name: account.name.clone(),
                stored_balance: account.balance,
                computed_balance: computed,
            })
        })
        .collect();

    let transaction_mismatches = transactions
        .iter()
        .filter_map(|transaction| {
            let computed = by_transaction
                .get(transaction.id.as_str())
                .copied()
                .unwrap_or_default();
            (computed != transaction.total).then(|| TransactionMismatch {
                transaction_id: transaction.id.clone(),
                number: transaction.number,
                stored_total: transaction.total,
                computed_total: computed,
            })
        })
        .collect();

    ConsistencyReport {
        checked_at,
        accounts_checked: accounts.len(),
        transactions_checked: transactions.len(),
        account_mismatches,
        transaction_mismatches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::AccountType;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 8, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn account(id: &str, balance: Decimal) -> Account {
        Account {
            id: id.to_string(),
            name: id.to_string(),
            account_type: AccountType::Cash,
            currency: "USD".to_string(),
            balance,
            created_at: now(),
            updated_at: now(),
        }
    }

    fn transaction(id: &str, total: Decimal) -> Transaction {
        Transaction {
            id: id.to_string(),
            number: 7,
            category_id: "misc".to_string(),
            description: "test".to_string(),
            details: None,
            currency: "USD".to_string(),
            total,
            incurred_at: now(),
            created_at: now(),
            updated_at: now(),
        }
    }

    fn entry(tx: &str, account: &str, amount: Decimal) -> Entry {
        Entry {
            id: format!("{}-{}", tx, account),
            transaction_id: tx.to_string(),
            account_id: account.to_string(),
            amount,
            recorded_at: now(),
            reference: None,
        }
    }

    #[test]
    fn test_consistent_ledger_has_no_mismatches() {
        let report = find_mismatches(
            &[
                account("cash", dec!(70)),
                account("card", dec!(-20)),
                account("empty", dec!(0)),
            ],
            &[transaction("t1", dec!(100)), transaction("t2", dec!(-50))],
            &[
                entry("t1", "cash", dec!(100)),
                entry("t2", "cash", dec!(-30)),
                entry("t2", "card", dec!(-20)),
            ],
            now(),
        );
        assert!(report.is_consistent());
        assert_eq!(report.accounts_checked, 3);
    }

    #[test]
    fn test_drifted_balances_are_reported() {
        let report = find_mismatches(
            &[account("cash", dec!(90))],
            &[transaction("t1", dec!(100.00))],
            &[entry("t1", "cash", dec!(100))],
            now(),
        );

        assert!(!report.is_consistent());
        assert_eq!(report.issue_count(), 1);
        assert_eq!(report.account_mismatches[0].difference(), dec!(-10));
        assert_eq!(report.accounts_checked, 1);
        assert_eq!(report.transactions_checked, 1);
    }
}
