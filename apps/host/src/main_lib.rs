use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use ledgerbook_core::{
    accounts::{AccountService, AccountServiceTrait},
    categories::{CategoryService, CategoryServiceTrait},
    entries::{EntryService, EntryServiceTrait},
    events::{watch_query, BroadcastEventSink, EventInterest},
    fx::{FxService, FxServiceTrait, HttpRateSource},
    health::{HealthService, HealthServiceTrait},
    summary::{BalanceSheet, SummaryService, SummaryServiceTrait},
    transactions::{TransactionService, TransactionServiceTrait},
};
use ledgerbook_storage_sqlite::{
    db, AccountRepository, CategoryRepository, EntryRepository, FxRepository,
    TransactionRepository,
};

use crate::config::{Config, LogFormat};

/// Buffered events per subscriber before it starts lagging.
const EVENT_CHANNEL_CAPACITY: usize = 256;

pub struct AppContext {
    pub db_path: String,
    pub base_currency: String,
    pub event_sink: Arc<BroadcastEventSink>,
    pub account_service: Arc<dyn AccountServiceTrait>,
    pub category_service: Arc<dyn CategoryServiceTrait>,
    pub transaction_service: Arc<dyn TransactionServiceTrait>,
    pub entry_service: Arc<dyn EntryServiceTrait>,
    pub fx_service: Arc<dyn FxServiceTrait>,
    pub summary_service: Arc<dyn SummaryServiceTrait>,
    pub health_service: Arc<dyn HealthServiceTrait>,
}

impl AppContext {
    /// Balance sheet in the configured currency, refreshed whenever balances
    /// or exchange rates change.
    pub fn watch_balance_sheet(&self) -> ledgerbook_core::Result<watch::Receiver<BalanceSheet>> {
        let summary = self.summary_service.clone();
        let currency = self.base_currency.clone();
        let interest = EventInterest {
            exchange_rates: true,
            ..EventInterest::BALANCES
        };
        watch_query(&self.event_sink, interest, move || {
            summary.balance_sheet(&currency)
        })
    }
}

pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false))
            .init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init(),
    }
}

pub async fn build_context(config: &Config) -> anyhow::Result<AppContext> {
    db::prepare_database(&config.db_path)?;
    tracing::info!("Database path in use: {}", config.db_path);

    let pool = db::create_pool(&config.db_path)?;
    db::run_migrations(&pool)?;
    let writer = db::spawn_writer((*pool).clone());

    let event_sink = Arc::new(BroadcastEventSink::new(EVENT_CHANNEL_CAPACITY));

    let account_repo = Arc::new(AccountRepository::new(pool.clone(), writer.clone()));
    let category_repo = Arc::new(CategoryRepository::new(pool.clone(), writer.clone()));
    let transaction_repo = Arc::new(TransactionRepository::new(pool.clone(), writer.clone()));
    let entry_repo = Arc::new(EntryRepository::new(pool.clone(), writer.clone()));
    let fx_repo = Arc::new(FxRepository::new(pool.clone(), writer));

    let rate_source = Arc::new(HttpRateSource::new(config.http_timeout)?);
    let fx_service: Arc<dyn FxServiceTrait> = Arc::new(FxService::new(
        fx_repo,
        rate_source,
        event_sink.clone(),
    ));

    let account_service = Arc::new(AccountService::new(
        account_repo.clone(),
        event_sink.clone(),
    ));
    let category_service = Arc::new(CategoryService::new(
        category_repo.clone(),
        event_sink.clone(),
    ));
    let transaction_service = Arc::new(TransactionService::new(
        transaction_repo.clone(),
        account_repo.clone(),
        category_repo.clone(),
        event_sink.clone(),
    ));
    let entry_service = Arc::new(EntryService::new(
        entry_repo.clone(),
        transaction_repo.clone(),
        account_repo.clone(),
        event_sink.clone(),
    ));
    let summary_service = Arc::new(SummaryService::new(
        account_repo.clone(),
        transaction_repo.clone(),
        category_repo,
        fx_service.clone(),
    ));
    let health_service = Arc::new(HealthService::new(
        account_repo,
        transaction_repo,
        entry_repo,
        event_sink.clone(),
    ));

    Ok(AppContext {
        db_path: config.db_path.clone(),
        base_currency: config.base_currency.clone(),
        event_sink,
        account_service,
        category_service,
        transaction_service,
        entry_service,
        fx_service,
        summary_service,
        health_service,
    })
}
