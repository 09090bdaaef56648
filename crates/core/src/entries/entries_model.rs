//! Entry domain models and the balance planning that keeps accounts and
//! transaction totals in step with their entries.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::accounts::Account;
use crate::errors::EntryIssue;
use crate::fx::normalize_currency_code;
use crate::paging::page_offset;

/// Which side of the ledger an entry books to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntrySide {
    Debit,
    Credit,
}

impl EntrySide {
    pub fn of(amount: Decimal) -> Self {
        if amount < Decimal::ZERO {
            EntrySide::Credit
        } else {
            EntrySide::Debit
        }
    }
}

/// One leg of a transaction, booked against a single account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: String,
    pub transaction_id: String,
    pub account_id: String,
    /// Signed amount in the account's currency; debits are positive.
    pub amount: Decimal,
    pub recorded_at: NaiveDateTime,
    pub reference: Option<String>,
}

impl Entry {
    pub fn side(&self) -> EntrySide {
        EntrySide::of(self.amount)
    }
}

/// Entry draft as submitted on a transaction form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEntry {
    pub account_id: Option<String>,
    pub currency: Option<String>,
    pub amount: Decimal,
    /// Defaults to the transaction's `incurred_at`.
    pub recorded_at: Option<NaiveDateTime>,
    pub reference: Option<String>,
}

/// Changes to an existing entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryUpdate {
    pub id: String,
    /// Target account; a different account moves the entry.
    pub account_id: String,
    pub amount: Decimal,
    /// `None` keeps the current timestamp.
    pub recorded_at: Option<NaiveDateTime>,
    pub reference: Option<String>,
}

/// An entry together with the header fields of its transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryWithTransaction {
    #[serde(flatten)]
    pub entry: Entry,
    pub transaction_number: i64,
    pub description: String,
    pub category_id: String,
}

/// One line of an account register.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterLine {
    #[serde(flatten)]
    pub entry: EntryWithTransaction,
    pub side: EntrySide,
    /// Account balance right after this entry.
    pub running_balance: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPage {
    pub data: Vec<RegisterLine>,
    pub total_row_count: i64,
    pub page: i64,
    pub page_size: i64,
}

/// A change to a stored balance or total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BalanceAdjustment {
    /// Add `delta` to the account's stored balance.
    Account { account_id: String, delta: Decimal },
    /// Add `delta` to the transaction's stored total.
    TransactionTotal {
        transaction_id: String,
        delta: Decimal,
    },
    /// Replace the account's balance with the sum of its entries.
    Recompute { account_id: String },
}

impl BalanceAdjustment {
    pub fn account_id(&self) -> Option<&str> {
        match self {
            BalanceAdjustment::Account { account_id, .. }
            | BalanceAdjustment::Recompute { account_id } => Some(account_id),
            BalanceAdjustment::TransactionTotal { .. } => None,
        }
    }
}

/// Plans the balance and total changes for one entry going from `old` to `new`.
///
/// `None` on either side means the entry is being added (`old`) or removed
/// (`new`). An entry that moves between accounts reverses on the old account,
/// books on the new one, and both are then recomputed from their entries.
/// Zero deltas are left out.
pub fn plan_entry_change(old: Option<&Entry>, new: Option<&Entry>) -> Vec<BalanceAdjustment> {
    let mut plan = Vec::new();
    match (old, new) {
        (None, None) => {}
        (None, Some(added)) => {
            push_account(&mut plan, &added.account_id, added.amount);
            push_total(&mut plan, &added.transaction_id, added.amount);
        }
        (Some(removed), None) => {
            push_account(&mut plan, &removed.account_id, -removed.amount);
            push_total(&mut plan, &removed.transaction_id, -removed.amount);
        }
        (Some(before), Some(after)) if before.account_id == after.account_id => {
            push_account(&mut plan, &after.account_id, after.amount - before.amount);
            push_total(&mut plan, &after.transaction_id, after.amount - before.amount);
        }
        (Some(before), Some(after)) => {
            push_account(&mut plan, &before.account_id, -before.amount);
            push_account(&mut plan, &after.account_id, after.amount);
            push_total(&mut plan, &after.transaction_id, after.amount - before.amount);
            plan.push(BalanceAdjustment::Recompute {
                account_id: before.account_id.clone(),
            });
            plan.push(BalanceAdjustment::Recompute {
                account_id: after.account_id.clone(),
            });
        }
    }
    plan
}

/// Plans the changes for writing a new transaction with `entries`.
/// Deltas on the same account are merged.
pub fn plan_transaction_creation(entries: &[Entry]) -> Vec<BalanceAdjustment> {
    merge_adjustments(
        entries
            .iter()
            .flat_map(|entry| plan_entry_change(None, Some(entry))),
    )
}

/// Plans the account reversals for deleting a transaction with `entries`.
/// The transaction row goes away, so no total adjustment is planned.
pub fn plan_transaction_removal(entries: &[Entry]) -> Vec<BalanceAdjustment> {
    merge_adjustments(
        entries
            .iter()
            .flat_map(|entry| plan_entry_change(Some(entry), None))
            .filter(|adj| !matches!(adj, BalanceAdjustment::TransactionTotal { .. })),
    )
}

/// Sums deltas per target in first-seen order and drops those that cancel out.
/// Recomputes are kept once and placed last.
pub fn merge_adjustments(
    adjustments: impl IntoIterator<Item = BalanceAdjustment>,
) -> Vec<BalanceAdjustment> {
    let mut deltas: Vec<BalanceAdjustment> = Vec::new();
    let mut positions: HashMap<(bool, String), usize> = HashMap::new();
    let mut recomputes: Vec<BalanceAdjustment> = Vec::new();

    for adjustment in adjustments {
        let (key, delta) = match &adjustment {
            BalanceAdjustment::Account { account_id, delta } => ((true, account_id.clone()), *delta),
            BalanceAdjustment::TransactionTotal {
                transaction_id,
                delta,
            } => ((false, transaction_id.clone()), *delta),
            BalanceAdjustment::Recompute { .. } => {
                if !recomputes.contains(&adjustment) {
                    recomputes.push(adjustment);
                }
                continue;
            }
        };
        match positions.get(&key) {
            Some(&pos) => match &mut deltas[pos] {
                BalanceAdjustment::Account { delta: total, .. }
                | BalanceAdjustment::TransactionTotal { delta: total, .. } => *total += delta,
                BalanceAdjustment::Recompute { .. } => {}
            },
            None => {
                positions.insert(key, deltas.len());
                deltas.push(adjustment);
            }
        }
    }

    deltas.retain(|adj| match adj {
        BalanceAdjustment::Account { delta, .. }
        | BalanceAdjustment::TransactionTotal { delta, .. } => !delta.is_zero(),
        BalanceAdjustment::Recompute { .. } => true,
    });
    deltas.extend(recomputes);
    deltas
}

/// Every account touched by a plan, sorted and without duplicates.
pub fn touched_accounts(plan: &[BalanceAdjustment]) -> Vec<String> {
    let mut ids: Vec<String> = plan
        .iter()
        .filter_map(|adj| adj.account_id().map(str::to_string))
        .collect();
    ids.sort();
    ids.dedup();
    ids
}

fn push_account(plan: &mut Vec<BalanceAdjustment>, account_id: &str, delta: Decimal) {
    if !delta.is_zero() {
        plan.push(BalanceAdjustment::Account {
            account_id: account_id.to_string(),
            delta,
        });
    }
}

fn push_total(plan: &mut Vec<BalanceAdjustment>, transaction_id: &str, delta: Decimal) {
    if !delta.is_zero() {
        plan.push(BalanceAdjustment::TransactionTotal {
            transaction_id: transaction_id.to_string(),
            delta,
        });
    }
}

/// Checks one entry draft against the accounts it may book to.
///
/// The entry must name an account and a currency, the account must exist,
/// and the account, the entry and the transaction must share a currency.
/// Every problem found is returned, tagged with `index`.
pub fn check_entry_draft(
    index: usize,
    draft: &NewEntry,
    transaction_currency: Option<&str>,
    accounts: &HashMap<String, Account>,
) -> Vec<EntryIssue> {
    let mut issues = Vec::new();

    let account = match draft.account_id.as_deref().map(str::trim) {
        None | Some("") => {
            issues.push(EntryIssue::new(index, "account", "Account is required"));
            None
        }
        Some(id) => {
            let found = accounts.get(id);
            if found.is_none() {
                issues.push(EntryIssue::new(
                    index,
                    "account",
                    format!("Account {} does not exist", id),
                ));
            }
            found
        }
    };

    let currency = match draft.currency.as_deref().map(str::trim) {
        None | Some("") => {
            issues.push(EntryIssue::new(index, "currency", "Currency is required"));
            None
        }
        Some(code) => match normalize_currency_code(code) {
            Ok(code) => Some(code),
            Err(_) => {
                issues.push(EntryIssue::new(
                    index,
                    "currency",
                    format!("'{}' is not a currency code", code),
                ));
                None
            }
        },
    };

    if let (Some(account), Some(currency)) = (account, currency.as_deref()) {
        if account.currency != currency {
            issues.push(EntryIssue::new(
                index,
                "currency",
                format!(
                    "Account '{}' is kept in {}, not {}",
                    account.name, account.currency, currency
                ),
            ));
        } else if let Some(expected) = transaction_currency {
            if expected != currency {
                issues.push(EntryIssue::new(
                    index,
                    "currency",
                    format!("Entry is in {} but the transaction is in {}", currency, expected),
                ));
            }
        }
    }

    issues
}

/// Computes running balances over entries in booking order and returns the
/// requested page, newest first.
pub fn build_register(
    mut rows: Vec<EntryWithTransaction>,
    page: i64,
    page_size: i64,
) -> RegisterPage {
    rows.sort_by(|a, b| {
        a.entry
            .recorded_at
            .cmp(&b.entry.recorded_at)
            .then(a.transaction_number.cmp(&b.transaction_number))
            .then_with(|| a.entry.id.cmp(&b.entry.id))
    });

    let mut balance = Decimal::ZERO;
    let mut lines: Vec<RegisterLine> = rows
        .into_iter()
        .map(|row| {
            balance += row.entry.amount;
            RegisterLine {
                side: row.entry.side(),
                entry: row,
                running_balance: balance,
            }
        })
        .collect();
    lines.reverse();

    let total_row_count = lines.len() as i64;
    let data = lines
        .into_iter()
        .skip(usize::try_from(page_offset(page, page_size)).unwrap_or(usize::MAX))
        .take(usize::try_from(page_size).unwrap_or(0))
        .collect();

    RegisterPage {
        data,
        total_row_count,
        page,
        page_size,
    }
}
