//! In-memory repositories for service tests.
//!
//! One `InMemoryLedger` implements every repository trait over shared state
//! and applies balance plans the same way the SQLite repositories do.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::accounts::{Account, AccountFilter, AccountRepositoryTrait, AccountUpdate, NewAccount};
use crate::categories::{
    check_deletable, check_parent_assignment, Category, CategoryRepositoryTrait, CategoryUpdate,
    NewCategory,
};
use crate::entries::{
    plan_entry_change, plan_transaction_creation, plan_transaction_removal, BalanceAdjustment,
    Entry, EntryRepositoryTrait, EntryWithTransaction,
};
use crate::errors::{DatabaseError, Error, LedgerError, Result};
use crate::fx::{ExchangeRate, FxRepositoryTrait, NewExchangeRate, RateSource};
use crate::transactions::{
    next_transaction_number, Transaction, TransactionDetails, TransactionDraft, TransactionPage,
    TransactionQuery, TransactionRepositoryTrait, TransactionUpdate,
};

#[derive(Default)]
pub struct LedgerState {
    pub accounts: Vec<Account>,
    pub categories: Vec<Category>,
    pub transactions: Vec<Transaction>,
    pub entries: Vec<Entry>,
    pub rates: Vec<ExchangeRate>,
}

impl LedgerState {
    fn apply(&mut self, plan: &[BalanceAdjustment]) -> Result<()> {
        for adjustment in plan {
            match adjustment {
                BalanceAdjustment::Account { account_id, delta } => {
                    self.account_mut(account_id)?.balance += *delta;
                }
                BalanceAdjustment::TransactionTotal {
                    transaction_id,
                    delta,
                } => {
                    self.transaction_mut(transaction_id)?.total += *delta;
                }
                BalanceAdjustment::Recompute { account_id } => {
                    let sum = self.entry_sum_for_account(account_id);
                    self.account_mut(account_id)?.balance = sum;
                }
            }
        }
        Ok(())
    }

    fn entry_sum_for_account(&self, account_id: &str) -> Decimal {
        self.entries
            .iter()
            .filter(|e| e.account_id == account_id)
            .map(|e| e.amount)
            .sum()
    }

    fn account_mut(&mut self, id: &str) -> Result<&mut Account> {
        self.accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| LedgerError::AccountNotFound(id.to_string()).into())
    }

    fn transaction_mut(&mut self, id: &str) -> Result<&mut Transaction> {
        self.transactions
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| LedgerError::TransactionNotFound(id.to_string()).into())
    }

    fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    fn child_count(&self, id: &str) -> i64 {
        self.categories
            .iter()
            .filter(|c| c.parent_id.as_deref() == Some(id))
            .count() as i64
    }
}

#[derive(Clone, Default)]
pub struct InMemoryLedger {
    pub state: Arc<Mutex<LedgerState>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&mut LedgerState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn account(&self, id: &str) -> Account {
        self.with_state(|s| s.accounts.iter().find(|a| a.id == id).cloned())
            .unwrap_or_else(|| panic!("no account {}", id))
    }

    pub fn transaction(&self, id: &str) -> Transaction {
        self.with_state(|s| s.transactions.iter().find(|t| t.id == id).cloned())
            .unwrap_or_else(|| panic!("no transaction {}", id))
    }
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

fn not_found(what: &str, id: &str) -> Error {
    Error::Database(DatabaseError::NotFound(format!("{} {}", what, id)))
}

#[async_trait]
impl AccountRepositoryTrait for InMemoryLedger {
    async fn create(&self, new_account: NewAccount) -> Result<Account> {
        let account = Account {
            id: new_account
                .id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            name: new_account.name,
            account_type: new_account.account_type,
            currency: new_account.currency,
            balance: Decimal::ZERO,
            created_at: now(),
            updated_at: now(),
        };
        self.with_state(|s| s.accounts.push(account.clone()));
        Ok(account)
    }

    async fn update(&self, update: AccountUpdate) -> Result<Account> {
        let id = update.id.clone().unwrap_or_default();
        self.with_state(|s| {
            let has_entries = s.entries.iter().any(|e| e.account_id == id);
            let account = s.account_mut(&id)?;
            if let Some(currency) = update.currency {
                if currency != account.currency && has_entries {
                    return Err(Error::ConstraintViolation(
                        "currency cannot change once entries exist".to_string(),
                    ));
                }
                account.currency = currency;
            }
            account.name = update.name;
            account.account_type = update.account_type;
            account.updated_at = now();
            Ok(account.clone())
        })
    }

    async fn delete(&self, account_id: &str) -> Result<usize> {
        self.with_state(|s| {
            if s.entries.iter().any(|e| e.account_id == account_id) {
                return Err(Error::ConstraintViolation(
                    "account has entries".to_string(),
                ));
            }
            let before = s.accounts.len();
            s.accounts.retain(|a| a.id != account_id);
            Ok(before - s.accounts.len())
        })
    }

    async fn recalculate_balance(&self, account_id: &str) -> Result<Account> {
        self.with_state(|s| {
            s.apply(&[BalanceAdjustment::Recompute {
                account_id: account_id.to_string(),
            }])?;
            Ok(s.account_mut(account_id)?.clone())
        })
    }

    fn get_by_id(&self, account_id: &str) -> Result<Account> {
        self.with_state(|s| s.accounts.iter().find(|a| a.id == account_id).cloned())
            .ok_or_else(|| not_found("account", account_id))
    }

    fn list(&self, filter: &AccountFilter) -> Result<Vec<Account>> {
        let mut accounts: Vec<Account> = self.with_state(|s| s.accounts.clone());
        accounts.retain(|a| {
            filter.account_type.map_or(true, |t| a.account_type == t)
                && filter.currency.as_deref().map_or(true, |c| a.currency == c)
        });
        accounts.sort_by(|a, b| {
            a.account_type
                .cmp(&b.account_type)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(accounts)
    }

    fn count_entries(&self, account_id: &str) -> Result<i64> {
        Ok(self.with_state(|s| {
            s.entries
                .iter()
                .filter(|e| e.account_id == account_id)
                .count() as i64
        }))
    }
}

#[async_trait]
impl CategoryRepositoryTrait for InMemoryLedger {
    async fn create(&self, new_category: NewCategory) -> Result<Category> {
        self.with_state(|s| {
            let parent = match new_category.parent_id.as_deref() {
                Some(id) => Some(
                    s.category(id)
                        .cloned()
                        .ok_or_else(|| LedgerError::CategoryNotFound(id.to_string()))?,
                ),
                None => None,
            };
            check_parent_assignment(None, parent.as_ref(), 0)?;
            let category = Category {
                id: new_category
                    .id
                    .unwrap_or_else(|| Uuid::new_v4().to_string()),
                name: new_category.name,
                parent_id: new_category.parent_id,
                created_at: now(),
                updated_at: now(),
            };
            s.categories.push(category.clone());
            Ok(category)
        })
    }

    async fn update(&self, update: CategoryUpdate) -> Result<Category> {
        self.with_state(|s| {
            let parent = match update.parent_id.as_deref() {
                Some(id) => Some(
                    s.category(id)
                        .cloned()
                        .ok_or_else(|| LedgerError::CategoryNotFound(id.to_string()))?,
                ),
                None => None,
            };
            let children = s.child_count(&update.id);
            check_parent_assignment(Some(&update.id), parent.as_ref(), children)?;
            let category = s
                .categories
                .iter_mut()
                .find(|c| c.id == update.id)
                .ok_or_else(|| LedgerError::CategoryNotFound(update.id.clone()))?;
            category.name = update.name;
            category.parent_id = update.parent_id;
            category.updated_at = now();
            Ok(category.clone())
        })
    }

    async fn delete(&self, id: &str) -> Result<usize> {
        self.with_state(|s| {
            let category = s
                .category(id)
                .cloned()
                .ok_or_else(|| LedgerError::CategoryNotFound(id.to_string()))?;
            let transactions = s
                .transactions
                .iter()
                .filter(|t| t.category_id == id)
                .count() as i64;
            check_deletable(&category.name, s.child_count(id), transactions)?;
            s.categories.retain(|c| c.id != id);
            Ok(1)
        })
    }

    fn get_by_id(&self, id: &str) -> Result<Option<Category>> {
        Ok(self.with_state(|s| s.category(id).cloned()))
    }

    fn list(&self) -> Result<Vec<Category>> {
        let mut categories = self.with_state(|s| s.categories.clone());
        categories.sort_by(|a, b| {
            b.is_parent()
                .cmp(&a.is_parent())
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(categories)
    }

    fn transaction_counts(&self) -> Result<HashMap<String, i64>> {
        Ok(self.with_state(|s| {
            let mut counts = HashMap::new();
            for transaction in &s.transactions {
                *counts.entry(transaction.category_id.clone()).or_insert(0) += 1;
            }
            counts
        }))
    }
}

#[async_trait]
impl TransactionRepositoryTrait for InMemoryLedger {
    async fn create(&self, draft: TransactionDraft) -> Result<TransactionDetails> {
        self.with_state(|s| {
            let last = s.transactions.iter().map(|t| t.number).max();
            let transaction = Transaction {
                id: draft.id.clone(),
                number: next_transaction_number(Utc::now().timestamp_millis(), last),
                category_id: draft.category_id,
                description: draft.description,
                details: draft.details,
                currency: draft.currency,
                total: Decimal::ZERO,
                incurred_at: draft.incurred_at,
                created_at: now(),
                updated_at: now(),
            };
            s.transactions.push(transaction);
            s.entries.extend(draft.entries.iter().cloned());
            s.apply(&plan_transaction_creation(&draft.entries))?;
            Ok(TransactionDetails {
                transaction: s.transaction_mut(&draft.id)?.clone(),
                entries: draft.entries,
            })
        })
    }

    async fn update(&self, update: TransactionUpdate) -> Result<Transaction> {
        self.with_state(|s| {
            if let Some(currency) = &update.currency {
                let foreign = s.entries.iter().any(|e| {
                    e.transaction_id == update.id
                        && s
                            .accounts
                            .iter()
                            .any(|a| a.id == e.account_id && &a.currency != currency)
                });
                if foreign {
                    return Err(Error::ConstraintViolation(
                        "entries exist in another currency".to_string(),
                    ));
                }
            }
            let transaction = s.transaction_mut(&update.id)?;
            transaction.category_id = update.category_id;
            transaction.description = update.description;
            transaction.details = update.details;
            if let Some(currency) = update.currency {
                transaction.currency = currency;
            }
            transaction.incurred_at = update.incurred_at;
            transaction.updated_at = now();
            Ok(transaction.clone())
        })
    }

    async fn delete(&self, transaction_id: &str) -> Result<TransactionDetails> {
        self.with_state(|s| {
            let transaction = s.transaction_mut(transaction_id)?.clone();
            let entries: Vec<Entry> = s
                .entries
                .iter()
                .filter(|e| e.transaction_id == transaction_id)
                .cloned()
                .collect();
            s.apply(&plan_transaction_removal(&entries))?;
            s.entries.retain(|e| e.transaction_id != transaction_id);
            s.transactions.retain(|t| t.id != transaction_id);
            Ok(TransactionDetails {
                transaction,
                entries,
            })
        })
    }

    async fn recalculate_total(&self, transaction_id: &str) -> Result<Transaction> {
        self.with_state(|s| {
            let total: Decimal = s
                .entries
                .iter()
                .filter(|e| e.transaction_id == transaction_id)
                .map(|e| e.amount)
                .sum();
            let transaction = s.transaction_mut(transaction_id)?;
            transaction.total = total;
            Ok(transaction.clone())
        })
    }

    fn get_by_id(&self, transaction_id: &str) -> Result<Transaction> {
        self.with_state(|s| s.transactions.iter().find(|t| t.id == transaction_id).cloned())
            .ok_or_else(|| not_found("transaction", transaction_id))
    }

    fn get_details(&self, transaction_id: &str) -> Result<TransactionDetails> {
        let transaction = TransactionRepositoryTrait::get_by_id(self, transaction_id)?;
        let entries = self.list_for_transaction(transaction_id)?;
        Ok(TransactionDetails {
            transaction,
            entries,
        })
    }

    fn search(
        &self,
        query: &TransactionQuery,
        page: i64,
        page_size: i64,
    ) -> Result<TransactionPage> {
        let mut matched: Vec<Transaction> = self.with_state(|s| {
            s.transactions
                .iter()
                .filter(|t| {
                    query.category_id.as_deref().map_or(true, |c| {
                        t.category_id == c
                            || s.category(&t.category_id)
                                .and_then(|cat| cat.parent_id.as_deref())
                                == Some(c)
                    })
                })
                .filter(|t| {
                    query.account_id.as_deref().map_or(true, |a| {
                        s.entries
                            .iter()
                            .any(|e| e.transaction_id == t.id && e.account_id == a)
                    })
                })
                .filter(|t| query.incurred_from.map_or(true, |f| t.incurred_at >= f))
                .filter(|t| query.incurred_to.map_or(true, |to| t.incurred_at < to))
                .filter(|t| {
                    query.keyword.as_deref().map_or(true, |k| {
                        t.description.to_lowercase().contains(&k.to_lowercase())
                    })
                })
                .cloned()
                .collect()
        });
        matched.sort_by(|a, b| {
            b.incurred_at
                .cmp(&a.incurred_at)
                .then(b.number.cmp(&a.number))
        });
        let total_row_count = matched.len() as i64;
        let data = matched
            .into_iter()
            .skip((page * page_size) as usize)
            .take(page_size as usize)
            .collect();
        Ok(TransactionPage {
            data,
            total_row_count,
            page,
            page_size,
        })
    }

    fn list_in_range(
        &self,
        from: Option<NaiveDateTime>,
        to: Option<NaiveDateTime>,
    ) -> Result<Vec<Transaction>> {
        Ok(self.with_state(|s| {
            s.transactions
                .iter()
                .filter(|t| from.map_or(true, |f| t.incurred_at >= f))
                .filter(|t| to.map_or(true, |to| t.incurred_at < to))
                .cloned()
                .collect()
        }))
    }
}

#[async_trait]
impl EntryRepositoryTrait for InMemoryLedger {
    async fn insert(&self, entry: Entry) -> Result<Entry> {
        self.with_state(|s| {
            s.entries.push(entry.clone());
            s.apply(&plan_entry_change(None, Some(&entry)))?;
            Ok(entry)
        })
    }

    async fn update(&self, entry: Entry) -> Result<Entry> {
        self.with_state(|s| {
            let slot = s
                .entries
                .iter_mut()
                .find(|e| e.id == entry.id)
                .ok_or_else(|| LedgerError::EntryNotFound(entry.id.clone()))?;
            let old = std::mem::replace(slot, entry.clone());
            s.apply(&plan_entry_change(Some(&old), Some(&entry)))?;
            Ok(entry)
        })
    }

    async fn delete(&self, entry_id: &str) -> Result<Entry> {
        self.with_state(|s| {
            let old = s
                .entries
                .iter()
                .find(|e| e.id == entry_id)
                .cloned()
                .ok_or_else(|| LedgerError::EntryNotFound(entry_id.to_string()))?;
            s.entries.retain(|e| e.id != entry_id);
            s.apply(&plan_entry_change(Some(&old), None))?;
            Ok(old)
        })
    }

    fn get_by_id(&self, entry_id: &str) -> Result<Entry> {
        self.with_state(|s| s.entries.iter().find(|e| e.id == entry_id).cloned())
            .ok_or_else(|| not_found("entry", entry_id))
    }

    fn list_for_transaction(&self, transaction_id: &str) -> Result<Vec<Entry>> {
        Ok(self.with_state(|s| {
            s.entries
                .iter()
                .filter(|e| e.transaction_id == transaction_id)
                .cloned()
                .collect()
        }))
    }

    fn list_for_account(&self, account_id: &str) -> Result<Vec<EntryWithTransaction>> {
        Ok(self.with_state(|s| {
            s.entries
                .iter()
                .filter(|e| e.account_id == account_id)
                .filter_map(|e| {
                    s.transactions
                        .iter()
                        .find(|t| t.id == e.transaction_id)
                        .map(|t| EntryWithTransaction {
                            entry: e.clone(),
                            transaction_number: t.number,
                            description: t.description.clone(),
                            category_id: t.category_id.clone(),
                        })
                })
                .collect()
        }))
    }

    fn list_all(&self) -> Result<Vec<Entry>> {
        Ok(self.with_state(|s| s.entries.clone()))
    }
}

#[async_trait]
impl FxRepositoryTrait for InMemoryLedger {
    async fn upsert_rate(&self, rate: NewExchangeRate) -> Result<ExchangeRate> {
        self.with_state(|s| {
            s.rates.retain(|r| {
                !(r.base_currency == rate.base_currency
                    && r.counter_currency == rate.counter_currency
                    && r.since == rate.since)
            });
            let saved = ExchangeRate {
                id: Uuid::new_v4().to_string(),
                base_currency: rate.base_currency,
                counter_currency: rate.counter_currency,
                rate: rate.rate,
                since: rate.since,
            };
            s.rates.push(saved.clone());
            Ok(saved)
        })
    }

    async fn upsert_rates(&self, rates: Vec<NewExchangeRate>) -> Result<Vec<ExchangeRate>> {
        let mut saved = Vec::with_capacity(rates.len());
        for rate in rates {
            saved.push(self.upsert_rate(rate).await?);
        }
        Ok(saved)
    }

    async fn delete_rate(&self, rate_id: &str) -> Result<usize> {
        Ok(self.with_state(|s| {
            let before = s.rates.len();
            s.rates.retain(|r| r.id != rate_id);
            before - s.rates.len()
        }))
    }

    fn get_rate_by_id(&self, rate_id: &str) -> Result<Option<ExchangeRate>> {
        Ok(self.with_state(|s| s.rates.iter().find(|r| r.id == rate_id).cloned()))
    }

    fn list_rates(&self, base: Option<&str>, counter: Option<&str>) -> Result<Vec<ExchangeRate>> {
        Ok(self.with_state(|s| {
            s.rates
                .iter()
                .filter(|r| base.map_or(true, |b| r.base_currency == b))
                .filter(|r| counter.map_or(true, |c| r.counter_currency == c))
                .cloned()
                .collect()
        }))
    }

    fn find_effective_rate(
        &self,
        base: &str,
        counter: &str,
        on: NaiveDate,
    ) -> Result<Option<ExchangeRate>> {
        Ok(self.with_state(|s| {
            s.rates
                .iter()
                .filter(|r| r.base_currency == base && r.counter_currency == counter)
                .filter(|r| r.since <= on)
                .max_by_key(|r| r.since)
                .cloned()
        }))
    }

    fn latest_rates(&self) -> Result<Vec<ExchangeRate>> {
        Ok(self.with_state(|s| {
            let mut latest: HashMap<(String, String), ExchangeRate> = HashMap::new();
            for rate in &s.rates {
                let key = (rate.base_currency.clone(), rate.counter_currency.clone());
                match latest.get(&key) {
                    Some(existing) if existing.since >= rate.since => {}
                    _ => {
                        latest.insert(key, rate.clone());
                    }
                }
            }
            let mut rates: Vec<ExchangeRate> = latest.into_values().collect();
            rates.sort_by_key(ExchangeRate::pair);
            rates
        }))
    }
}

/// Rate source that serves a fixed document and records requested URLs.
#[derive(Default)]
pub struct StaticRateSource {
    pub document: Mutex<Option<Value>>,
    pub requested: Mutex<Vec<String>>,
}

impl StaticRateSource {
    pub fn new(document: Value) -> Self {
        Self {
            document: Mutex::new(Some(document)),
            requested: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl RateSource for StaticRateSource {
    async fn fetch_json(&self, url: &str) -> Result<Value> {
        self.requested.lock().unwrap().push(url.to_string());
        self.document
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| crate::fx::FxError::FetchError("no document".to_string()).into())
    }
}

pub fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

pub async fn seed_account(
    ledger: &InMemoryLedger,
    id: &str,
    account_type: crate::accounts::AccountType,
    currency: &str,
) -> Account {
    AccountRepositoryTrait::create(
        ledger,
        NewAccount {
            id: Some(id.to_string()),
            name: id.to_string(),
            account_type,
            currency: currency.to_string(),
        },
    )
    .await
    .unwrap()
}

pub async fn seed_category(ledger: &InMemoryLedger, id: &str, parent: Option<&str>) -> Category {
    CategoryRepositoryTrait::create(
        ledger,
        NewCategory {
            id: Some(id.to_string()),
            name: id.to_string(),
            parent_id: parent.map(str::to_string),
        },
    )
    .await
    .unwrap()
}
