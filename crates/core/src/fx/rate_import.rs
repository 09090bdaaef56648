//! Mapping of user-supplied JSON rate documents onto exchange rates.
//!
//! Two document shapes are understood:
//!
//! - an array of records, each carrying base, counter, rate and optionally a date
//!   under caller-chosen field names;
//! - an object keyed by counter currency (`{"EUR": 0.92, "GBP": 0.79}`), with the
//!   base read from a root field or supplied by the caller.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use super::currency::normalize_currency_code;
use super::fx_errors::FxError;
use super::fx_model::{NewExchangeRate, RateImportRequest, SkippedRecord};
use super::fx_traits::RateSource;
use crate::errors::Result;

/// Rates that mapped cleanly, plus the records that did not.
pub type MappedRates = (Vec<NewExchangeRate>, Vec<SkippedRecord>);

/// Plain HTTP GET source backed by `reqwest`.
pub struct HttpRateSource {
    client: reqwest::Client,
}

impl HttpRateSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FxError::from)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl RateSource for HttpRateSource {
    async fn fetch_json(&self, url: &str) -> Result<Value> {
        debug!("Fetching exchange rates from {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FxError::from)?
            .error_for_status()
            .map_err(FxError::from)?;
        let body = response.json::<Value>().await.map_err(FxError::from)?;
        Ok(body)
    }
}

/// Follows a dot-separated path (`data.rates`) from `root`. Numeric segments
/// index into arrays.
pub fn resolve_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(root, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

fn value_as_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok(),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

fn value_as_date(value: &Value) -> Option<NaiveDate> {
    let text = value.as_str()?.trim();
    // Accept full timestamps by keeping the date part.
    let day = text.get(..10).unwrap_or(text);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn required_field<'a>(field: &'a Option<String>, name: &str) -> Result<&'a str> {
    field
        .as_deref()
        .filter(|f| !f.trim().is_empty())
        .ok_or_else(|| FxError::MappingError(format!("'{}' must be configured", name)).into())
}

/// Maps a fetched document to rate inputs according to `request`.
///
/// Structural problems (missing records, unconfigured fields) fail the whole
/// import; problems with individual records are reported as skipped.
pub fn map_rate_document(
    document: &Value,
    request: &RateImportRequest,
    today: NaiveDate,
) -> Result<MappedRates> {
    let records = resolve_path(document, &request.records_path).ok_or_else(|| {
        FxError::MappingError(format!("path '{}' not found in document", request.records_path))
    })?;
    let default_since = request.since.unwrap_or(today);

    match records {
        Value::Array(items) => map_record_array(items, request, default_since),
        Value::Object(map) => map_keyed_rates(document, map, request, default_since),
        _ => Err(FxError::MappingError(format!(
            "path '{}' does not point to an array or object",
            request.records_path
        ))
        .into()),
    }
}

fn map_record_array(
    items: &[Value],
    request: &RateImportRequest,
    default_since: NaiveDate,
) -> Result<MappedRates> {
    let counter_field = required_field(&request.counter_field, "counterField")?;
    let rate_field = required_field(&request.rate_field, "rateField")?;
    if request.base_field.is_none() && request.base_currency.is_none() {
        return Err(
            FxError::MappingError("either baseField or baseCurrency is required".to_string()).into(),
        );
    }

    let mut rates = Vec::new();
    let mut skipped = Vec::new();

    for (index, item) in items.iter().enumerate() {
        let skip = |reason: String| SkippedRecord {
            record: index.to_string(),
            reason,
        };

        let base = request
            .base_field
            .as_deref()
            .and_then(|f| item.get(f))
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| request.base_currency.clone());
        let Some(base) = base else {
            skipped.push(skip("missing base currency".to_string()));
            continue;
        };
        let Some(counter) = item.get(counter_field).and_then(Value::as_str) else {
            skipped.push(skip(format!("missing '{}'", counter_field)));
            continue;
        };
        let Some(rate) = item.get(rate_field).and_then(value_as_decimal) else {
            skipped.push(skip(format!("missing or non-numeric '{}'", rate_field)));
            continue;
        };
        let since = match request.since_field.as_deref() {
            Some(f) => match item.get(f) {
                Some(v) => match value_as_date(v) {
                    Some(d) => d,
                    None => {
                        skipped.push(skip(format!("'{}' is not a YYYY-MM-DD date", f)));
                        continue;
                    }
                },
                None => default_since,
            },
            None => default_since,
        };

        let candidate = NewExchangeRate {
            base_currency: base,
            counter_currency: counter.to_string(),
            rate,
            since,
        };
        match candidate.normalized() {
            Ok(rate) => rates.push(rate),
            Err(e) => skipped.push(skip(e.to_string())),
        }
    }

    Ok((rates, skipped))
}

fn map_keyed_rates(
    document: &Value,
    map: &Map<String, Value>,
    request: &RateImportRequest,
    default_since: NaiveDate,
) -> Result<MappedRates> {
    let base = request
        .base_field
        .as_deref()
        .and_then(|f| resolve_path(document, f))
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| request.base_currency.clone())
        .ok_or_else(|| FxError::MappingError("base currency not found".to_string()))?;
    let base = normalize_currency_code(&base)?;

    let since = request
        .since_field
        .as_deref()
        .and_then(|f| resolve_path(document, f))
        .and_then(value_as_date)
        .unwrap_or(default_since);

    let mut rates = Vec::new();
    let mut skipped = Vec::new();

    for (code, value) in map {
        if code.eq_ignore_ascii_case(&base) {
            continue;
        }
        let Some(rate) = value_as_decimal(value) else {
            skipped.push(SkippedRecord {
                record: code.clone(),
                reason: "rate is not numeric".to_string(),
            });
            continue;
        };
        let candidate = NewExchangeRate {
            base_currency: base.clone(),
            counter_currency: code.clone(),
            rate,
            since,
        };
        match candidate.normalized() {
            Ok(rate) => rates.push(rate),
            Err(e) => skipped.push(SkippedRecord {
                record: code.clone(),
                reason: e.to_string(),
            }),
        }
    }

    Ok((rates, skipped))
}
