//! Domain event types.

use serde::{Deserialize, Serialize};

/// Domain events emitted by core services after successful mutations.
///
/// Consumers use them to refresh whatever they show (account lists,
/// registers, summaries) without polling the database.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// Accounts were created, updated, deleted, or had their balance recomputed.
    AccountsChanged { account_ids: Vec<String> },

    /// Categories were created, updated, or deleted.
    CategoriesChanged { category_ids: Vec<String> },

    /// Transactions or their entries changed. `account_ids` lists every
    /// account whose balance may have moved.
    TransactionsChanged {
        transaction_ids: Vec<String>,
        account_ids: Vec<String>,
    },

    /// Exchange rates were stored or removed.
    ExchangeRatesChanged { pairs: Vec<String> },
}

/// Which kinds of events a subscriber cares about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct EventInterest {
    pub accounts: bool,
    pub categories: bool,
    pub transactions: bool,
    pub exchange_rates: bool,
}

impl EventInterest {
    pub const ALL: EventInterest = EventInterest {
        accounts: true,
        categories: true,
        transactions: true,
        exchange_rates: true,
    };

    /// Balances move with accounts and with entries.
    pub const BALANCES: EventInterest = EventInterest {
        accounts: true,
        categories: false,
        transactions: true,
        exchange_rates: false,
    };

    pub fn matches(&self, event: &DomainEvent) -> bool {
        match event {
            DomainEvent::AccountsChanged { .. } => self.accounts,
            DomainEvent::CategoriesChanged { .. } => self.categories,
            DomainEvent::TransactionsChanged { .. } => self.transactions,
            DomainEvent::ExchangeRatesChanged { .. } => self.exchange_rates,
        }
    }
}

impl DomainEvent {
    pub fn accounts_changed(account_ids: Vec<String>) -> Self {
        Self::AccountsChanged { account_ids }
    }

    pub fn categories_changed(category_ids: Vec<String>) -> Self {
        Self::CategoriesChanged { category_ids }
    }

    /// Creates a TransactionsChanged event. Account IDs are sorted and deduplicated.
    pub fn transactions_changed(transaction_ids: Vec<String>, mut account_ids: Vec<String>) -> Self {
        account_ids.sort();
        account_ids.dedup();
        Self::TransactionsChanged {
            transaction_ids,
            account_ids,
        }
    }

    pub fn exchange_rates_changed(pairs: Vec<String>) -> Self {
        Self::ExchangeRatesChanged { pairs }
    }
}
