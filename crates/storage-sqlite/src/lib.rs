//! SQLite storage implementation for Ledgerbook.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the repository traits defined in `ledgerbook-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - Repository implementations for accounts, categories, transactions,
//!   entries and exchange rates
//! - Database-specific model types (with Diesel derives)
//!
//! Every mutation runs on the single writer actor inside an IMMEDIATE
//! transaction. Cached account balances and transaction totals are adjusted
//! in that same transaction, so a failed write never leaves them drifted.
//!
//! ```text
//! core (domain, traits)
//!          │
//!          ▼
//! storage-sqlite (this crate)
//!          │
//!          ▼
//!      SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod schema;

mod ledger;

// Repository implementations
pub mod accounts;
pub mod categories;
pub mod entries;
pub mod fx;
pub mod transactions;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, get_db_path, init, prepare_database, run_migrations,
    spawn_writer, DbConnection, DbPool, WriteHandle, DB_FILE_NAME,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

// Re-export repositories
pub use accounts::AccountRepository;
pub use categories::CategoryRepository;
pub use entries::EntryRepository;
pub use fx::FxRepository;
pub use transactions::TransactionRepository;

// Re-export from ledgerbook-core for convenience
pub use ledgerbook_core::errors::{DatabaseError, Error, Result};
