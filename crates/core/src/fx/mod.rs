//! FX (Foreign Exchange) module - exchange rates, lookups and JSON rate import.

pub mod currency;
mod fx_errors;
mod fx_model;
mod fx_service;
mod fx_traits;
pub mod rate_import;


pub use currency::{normalize_currency_code, same_currency};
pub use fx_errors::FxError;
pub use fx_model::{
    make_pair_key, ExchangeRate, NewExchangeRate, RateImportReport, RateImportRequest,
    SkippedRecord,
};
pub use fx_service::FxService;
pub use fx_traits::{FxRepositoryTrait, FxServiceTrait, RateSource};
pub use rate_import::HttpRateSource;
