use async_trait::async_trait;

use super::model::ConsistencyReport;
use crate::errors::Result;

/// Ledger consistency checks over stored balances and totals.
#[async_trait]
pub trait HealthServiceTrait: Send + Sync {
    /// Recomputes balances and totals from entries and reports any drift.
    fn check(&self) -> Result<ConsistencyReport>;

    /// Rewrites every drifted balance and total from the entries.
    ///
    /// Returns the report describing what was repaired.
    async fn repair(&self) -> Result<ConsistencyReport>;
}
