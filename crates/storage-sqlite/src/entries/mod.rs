//! SQLite storage implementation for ledger entries.

mod model;
mod repository;

pub use model::EntryDB;
pub use repository::EntryRepository;

pub(crate) use repository::load_transaction_entries;
