//! Ledger health module.
//!
//! Account balances and transaction totals are stored alongside the entries
//! they are derived from. This module detects drift between the two and
//! rewrites the stored values from the entries on request.

pub mod model;
pub mod service;
pub mod traits;

pub use model::{find_mismatches, AccountMismatch, ConsistencyReport, TransactionMismatch};
pub use service::HealthService;
pub use traits::HealthServiceTrait;
