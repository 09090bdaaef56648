use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::currency::normalize_currency_code;
use super::fx_errors::FxError;
use crate::errors::Result;

/// Rate at which one unit of `base_currency` buys `counter_currency`,
/// effective from `since` until a newer rate for the same pair.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRate {
    pub id: String,
    pub base_currency: String,
    pub counter_currency: String,
    #[serde(serialize_with = "serialize_decimal_6")]
    pub rate: Decimal,
    pub since: NaiveDate,
}

impl ExchangeRate {
    /// Pair key used in logs and events, e.g. `EUR/USD`.
    pub fn pair(&self) -> String {
        make_pair_key(&self.base_currency, &self.counter_currency)
    }
}

pub fn make_pair_key(base: &str, counter: &str) -> String {
    format!("{}/{}", base, counter)
}

fn serialize_decimal_6<S>(decimal: &Decimal, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let rounded = decimal.round_dp(6);
    serializer.serialize_str(&rounded.to_string())
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewExchangeRate {
    pub base_currency: String,
    pub counter_currency: String,
    pub rate: Decimal,
    pub since: NaiveDate,
}

impl NewExchangeRate {
    /// Validates the rate and returns a copy with normalized currency codes.
    pub fn normalized(&self) -> Result<Self> {
        let base = normalize_currency_code(&self.base_currency)?;
        let counter = normalize_currency_code(&self.counter_currency)?;
        if base == counter {
            return Err(FxError::InvalidCurrencyPair(make_pair_key(&base, &counter)).into());
        }
        if self.rate <= Decimal::ZERO {
            return Err(FxError::InvalidRate(format!(
                "{} for {} must be positive",
                self.rate,
                make_pair_key(&base, &counter)
            ))
            .into());
        }
        Ok(Self {
            base_currency: base,
            counter_currency: counter,
            rate: self.rate,
            since: self.since,
        })
    }
}

/// Describes where to fetch a JSON rate document and how to read it.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct RateImportRequest {
    pub url: String,
    /// Dot-separated path to the records; empty means the document root.
    #[serde(default)]
    pub records_path: String,
    /// Field holding the base currency. For keyed documents it is read from the root.
    pub base_field: Option<String>,
    /// Base currency used when the document does not carry one.
    pub base_currency: Option<String>,
    /// Field holding the counter currency (array documents only).
    pub counter_field: Option<String>,
    /// Field holding the rate (array documents only).
    pub rate_field: Option<String>,
    /// Field holding the effective date (`YYYY-MM-DD`).
    pub since_field: Option<String>,
    /// Effective date used when no `since_field` is configured or present.
    pub since: Option<NaiveDate>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRecord {
    /// Array index or object key of the record.
    pub record: String,
    pub reason: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct RateImportReport {
    pub imported: Vec<ExchangeRate>,
    pub skipped: Vec<SkippedRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_normalized_uppercases_codes() {
        let rate = NewExchangeRate {
            base_currency: "eur".to_string(),
            counter_currency: "usd".to_string(),
            rate: dec!(1.08),
            since: date(2024, 1, 1),
        }
        .normalized()
        .unwrap();
        assert_eq!(rate.base_currency, "EUR");
        assert_eq!(rate.counter_currency, "USD");
    }

    #[test]
    fn test_normalized_rejects_same_pair_and_non_positive_rate() {
        let same = NewExchangeRate {
            base_currency: "EUR".to_string(),
            counter_currency: "eur".to_string(),
            rate: dec!(1),
            since: date(2024, 1, 1),
        };
        assert!(same.normalized().is_err());

        let zero = NewExchangeRate {
            base_currency: "EUR".to_string(),
            counter_currency: "USD".to_string(),
            rate: Decimal::ZERO,
            since: date(2024, 1, 1),
        };
        assert!(zero.normalized().is_err());
    }

    #[test]
    fn test_rate_serializes_with_six_places() {
        let rate = ExchangeRate {
            id: "r1".to_string(),
            base_currency: "EUR".to_string(),
            counter_currency: "USD".to_string(),
            rate: dec!(1.123456789),
            since: date(2024, 1, 1),
        };
        let json = serde_json::to_value(&rate).unwrap();
        assert_eq!(json["rate"], "1.123457");
        assert_eq!(rate.pair(), "EUR/USD");
    }
}
