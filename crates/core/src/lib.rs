//! Ledgerbook Core - Domain entities, services, and traits.
//!
//! This crate contains the bookkeeping logic for Ledgerbook: accounts,
//! categories, transactions and their entries, exchange rates, summaries and
//! consistency checks. It is database-agnostic and defines traits that are
//! implemented by the `storage-sqlite` crate.

pub mod accounts;
pub mod categories;
pub mod constants;
pub mod entries;
pub mod errors;
pub mod events;
pub mod fx;
pub mod health;
pub mod paging;
pub mod summary;
pub mod transactions;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
