use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value;

use super::fx_model::{ExchangeRate, NewExchangeRate, RateImportReport, RateImportRequest};
use crate::errors::Result;

/// Trait defining the contract for exchange-rate persistence.
#[async_trait]
pub trait FxRepositoryTrait: Send + Sync {
    /// Inserts a rate, replacing an existing one for the same pair and date.
    async fn upsert_rate(&self, rate: NewExchangeRate) -> Result<ExchangeRate>;

    /// Upserts many rates in a single write.
    async fn upsert_rates(&self, rates: Vec<NewExchangeRate>) -> Result<Vec<ExchangeRate>>;

    /// Deletes a rate by ID, returning the number of deleted rows.
    async fn delete_rate(&self, rate_id: &str) -> Result<usize>;

    fn get_rate_by_id(&self, rate_id: &str) -> Result<Option<ExchangeRate>>;

    /// Lists rates, optionally restricted to a base and/or counter currency.
    fn list_rates(&self, base: Option<&str>, counter: Option<&str>) -> Result<Vec<ExchangeRate>>;

    /// The rate for the pair with the greatest `since` on or before `on`.
    fn find_effective_rate(
        &self,
        base: &str,
        counter: &str,
        on: NaiveDate,
    ) -> Result<Option<ExchangeRate>>;

    /// The newest rate of every stored pair.
    fn latest_rates(&self) -> Result<Vec<ExchangeRate>>;
}

/// Fetches a JSON document for rate import.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch_json(&self, url: &str) -> Result<Value>;
}

/// Trait defining the contract for FX service operations.
#[async_trait]
pub trait FxServiceTrait: Send + Sync {
    /// Exchange rate from `base` to `counter` effective on `on`.
    fn get_rate(&self, base: &str, counter: &str, on: NaiveDate) -> Result<Decimal>;

    fn convert(&self, amount: Decimal, from: &str, to: &str, on: NaiveDate) -> Result<Decimal>;

    fn list_rates(&self, base: Option<&str>, counter: Option<&str>) -> Result<Vec<ExchangeRate>>;

    fn latest_rates(&self) -> Result<Vec<ExchangeRate>>;

    async fn upsert_rate(&self, rate: NewExchangeRate) -> Result<ExchangeRate>;

    async fn delete_rate(&self, rate_id: &str) -> Result<()>;

    /// Downloads a JSON rate document and stores every record that maps cleanly.
    async fn import_rates(&self, request: RateImportRequest) -> Result<RateImportReport>;
}
