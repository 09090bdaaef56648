//! Host configuration read from the environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use ledgerbook_core::constants::DEFAULT_REPORTING_CURRENCY;
use ledgerbook_core::errors::{Error, Result};
use ledgerbook_core::fx::normalize_currency_code;
use ledgerbook_storage_sqlite::DB_FILE_NAME;

const APP_DIR_NAME: &str = "ledgerbook";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub db_path: String,
    pub base_currency: String,
    pub log_format: LogFormat,
    pub http_timeout: Duration,
}

impl Config {
    /// Loads `.env` when present, then reads the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let data_dir = var("LB_DATA_DIR")
            .map(PathBuf::from)
            .or_else(|| var("XDG_DATA_HOME").map(|xdg| Path::new(&xdg).join(APP_DIR_NAME)))
            .or_else(|| {
                ProjectDirs::from("", "", APP_DIR_NAME).map(|dirs| dirs.data_dir().to_path_buf())
            })
            .or_else(|| var("HOME").map(|home| Path::new(&home).join(".ledgerbook")))
            .unwrap_or_else(|| PathBuf::from("."));

        let db_path = var("LB_DB_PATH")
            .or_else(|| var("DATABASE_URL"))
            .unwrap_or_else(|| data_dir.join(DB_FILE_NAME).to_string_lossy().into_owned());

        let base_currency = normalize_currency_code(
            &var("LB_BASE_CURRENCY").unwrap_or_else(|| DEFAULT_REPORTING_CURRENCY.to_string()),
        )
        .map_err(|e| Error::InvalidConfigValue(format!("LB_BASE_CURRENCY: {}", e)))?;

        let log_format = match var("LB_LOG_FORMAT") {
            None => LogFormat::Text,
            Some(value) if value.eq_ignore_ascii_case("text") => LogFormat::Text,
            Some(value) if value.eq_ignore_ascii_case("json") => LogFormat::Json,
            Some(other) => {
                return Err(Error::InvalidConfigValue(format!(
                    "LB_LOG_FORMAT must be 'text' or 'json', got '{}'",
                    other
                )))
            }
        };

        let http_timeout = match var("LB_HTTP_TIMEOUT_SECS") {
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            Some(value) => value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or_else(|| {
                    Error::InvalidConfigValue(format!(
                        "LB_HTTP_TIMEOUT_SECS must be a positive number of seconds, got '{}'",
                        value
                    ))
                })?,
        };

        Ok(Self {
            data_dir,
            db_path,
            base_currency,
            log_format,
            http_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(move |key| vars.get(key).cloned())
    }

    #[test]
    fn test_explicit_values_win() {
        let config = config(&[
            ("LB_DATA_DIR", "/srv/books"),
            ("XDG_DATA_HOME", "/home/me/.local/share"),
            ("LB_BASE_CURRENCY", "eur"),
            ("LB_LOG_FORMAT", "JSON"),
            ("LB_HTTP_TIMEOUT_SECS", "5"),
        ])
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/srv/books"));
        assert_eq!(
            PathBuf::from(&config.db_path),
            Path::new("/srv/books").join(DB_FILE_NAME)
        );
        assert_eq!(config.base_currency, "EUR");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.http_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_db_path_overrides_and_xdg_fallback() {
        let config = config(&[
            ("XDG_DATA_HOME", "/home/me/.local/share"),
            ("DATABASE_URL", "/tmp/other.db"),
        ])
        .unwrap();
        assert_eq!(config.data_dir, Path::new("/home/me/.local/share").join("ledgerbook"));
        assert_eq!(config.db_path, "/tmp/other.db");
        assert_eq!(config.base_currency, "USD");
        assert_eq!(config.log_format, LogFormat::Text);

        let config = self::config(&[("LB_DB_PATH", "/tmp/mine.db"), ("DATABASE_URL", "/tmp/other.db")])
            .unwrap();
        assert_eq!(config.db_path, "/tmp/mine.db");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            config(&[("LB_LOG_FORMAT", "xml")]),
            Err(Error::InvalidConfigValue(_))
        ));
        assert!(matches!(
            config(&[("LB_HTTP_TIMEOUT_SECS", "0")]),
            Err(Error::InvalidConfigValue(_))
        ));
        assert!(matches!(
            config(&[("LB_BASE_CURRENCY", "dollars")]),
            Err(Error::InvalidConfigValue(_))
        ));
    }
}
