use ledgerbook_core::health::HealthServiceTrait;
use ledgerbook_core::summary::SummaryServiceTrait;
use ledgerbook_host::{build_context, init_tracing, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    tracing::info!(
        "Starting Ledgerbook {} (data dir {})",
        env!("CARGO_PKG_VERSION"),
        config.data_dir.display()
    );
    let ctx = build_context(&config).await?;

    let report = ctx.health_service.check()?;
    if report.is_consistent() {
        tracing::info!(
            "Ledger consistent: {} accounts, {} transactions checked",
            report.accounts_checked,
            report.transactions_checked
        );
    } else {
        tracing::warn!(
            "Ledger drift found: {} account and {} transaction mismatches",
            report.account_mismatches.len(),
            report.transaction_mismatches.len()
        );
    }

    let sheet = ctx.summary_service.balance_sheet(&ctx.base_currency)?;
    for total in &sheet.converted_totals {
        tracing::info!(
            "{:?}: {} {}",
            total.account_type,
            total.amount,
            sheet.reporting_currency
        );
    }
    if !sheet.unconverted.is_empty() {
        tracing::warn!(
            "{} accounts have no rate into {}",
            sheet.unconverted.len(),
            sheet.reporting_currency
        );
    }

    Ok(())
}
