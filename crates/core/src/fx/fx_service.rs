use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use log::{debug, info, warn};
use rust_decimal::Decimal;
use std::sync::Arc;

use super::currency::{normalize_currency_code, same_currency};
use super::fx_errors::FxError;
use super::fx_model::{ExchangeRate, NewExchangeRate, RateImportReport, RateImportRequest};
use super::fx_traits::{FxRepositoryTrait, FxServiceTrait, RateSource};
use super::rate_import::map_rate_document;
use crate::constants::DECIMAL_PRECISION;
use crate::errors::Result;
use crate::events::{DomainEvent, DomainEventSink};

pub struct FxService {
    repository: Arc<dyn FxRepositoryTrait>,
    rate_source: Arc<dyn RateSource>,
    event_sink: Arc<dyn DomainEventSink>,
}

impl FxService {
    pub fn new(
        repository: Arc<dyn FxRepositoryTrait>,
        rate_source: Arc<dyn RateSource>,
        event_sink: Arc<dyn DomainEventSink>,
    ) -> Self {
        Self {
            repository,
            rate_source,
            event_sink,
        }
    }

    fn emit_changed(&self, rates: &[ExchangeRate]) {
        if rates.is_empty() {
            return;
        }
        let mut pairs: Vec<String> = rates.iter().map(ExchangeRate::pair).collect();
        pairs.sort();
        pairs.dedup();
        self.event_sink
            .emit(DomainEvent::exchange_rates_changed(pairs));
    }
}

#[async_trait]
impl FxServiceTrait for FxService {
    fn get_rate(&self, base: &str, counter: &str, on: NaiveDate) -> Result<Decimal> {
        if same_currency(base, counter) {
            return Ok(Decimal::ONE);
        }
        let base = normalize_currency_code(base)?;
        let counter = normalize_currency_code(counter)?;

        if let Some(direct) = self.repository.find_effective_rate(&base, &counter, on)? {
            return Ok(direct.rate);
        }

        if let Some(reverse) = self.repository.find_effective_rate(&counter, &base, on)? {
            if !reverse.rate.is_zero() {
                debug!(
                    "Using inverse of {} for {}/{} on {}",
                    reverse.pair(),
                    base,
                    counter,
                    on
                );
                return Ok((Decimal::ONE / reverse.rate).round_dp(DECIMAL_PRECISION * 2));
            }
        }

        Err(FxError::RateNotFound {
            base,
            counter,
            date: on,
        }
        .into())
    }

    fn convert(&self, amount: Decimal, from: &str, to: &str, on: NaiveDate) -> Result<Decimal> {
        if same_currency(from, to) {
            return Ok(amount);
        }
        let rate = self.get_rate(from, to, on)?;
        Ok((amount * rate).round_dp(DECIMAL_PRECISION))
    }

    fn list_rates(&self, base: Option<&str>, counter: Option<&str>) -> Result<Vec<ExchangeRate>> {
        let base = base.map(normalize_currency_code).transpose()?;
        let counter = counter.map(normalize_currency_code).transpose()?;
        self.repository
            .list_rates(base.as_deref(), counter.as_deref())
    }

    fn latest_rates(&self) -> Result<Vec<ExchangeRate>> {
        self.repository.latest_rates()
    }

    async fn upsert_rate(&self, rate: NewExchangeRate) -> Result<ExchangeRate> {
        let rate = rate.normalized()?;
        let saved = self.repository.upsert_rate(rate).await?;
        self.emit_changed(std::slice::from_ref(&saved));
        Ok(saved)
    }

    async fn delete_rate(&self, rate_id: &str) -> Result<()> {
        let existing = self.repository.get_rate_by_id(rate_id)?;
        self.repository.delete_rate(rate_id).await?;
        if let Some(rate) = existing {
            self.emit_changed(&[rate]);
        }
        Ok(())
    }

    async fn import_rates(&self, request: RateImportRequest) -> Result<RateImportReport> {
        if request.url.trim().is_empty() {
            return Err(FxError::MappingError("url is required".to_string()).into());
        }
        let document = self.rate_source.fetch_json(request.url.trim()).await?;
        let today = Utc::now().date_naive();
        let (rates, skipped) = map_rate_document(&document, &request, today)?;

        for record in &skipped {
            warn!(
                "Skipping rate record {} from {}: {}",
                record.record, request.url, record.reason
            );
        }

        let imported = if rates.is_empty() {
            Vec::new()
        } else {
            self.repository.upsert_rates(rates).await?
        };
        info!(
            "Imported {} exchange rates from {} ({} skipped)",
            imported.len(),
            request.url,
            skipped.len()
        );
        self.emit_changed(&imported);

        Ok(RateImportReport { imported, skipped })
    }
}
