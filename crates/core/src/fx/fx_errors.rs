use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FxError {
    #[error("Exchange rate not found for {base}/{counter} on {date}")]
    RateNotFound {
        base: String,
        counter: String,
        date: NaiveDate,
    },

    #[error("Invalid currency pair: {0}")]
    InvalidCurrencyPair(String),

    #[error("Invalid exchange rate: {0}")]
    InvalidRate(String),

    #[error("Fetch error: {0}")]
    FetchError(String),

    #[error("Rate document could not be mapped: {0}")]
    MappingError(String),
}

impl From<reqwest::Error> for FxError {
    fn from(err: reqwest::Error) -> Self {
        FxError::FetchError(err.to_string())
    }
}
