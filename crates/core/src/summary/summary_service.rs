use chrono::{NaiveDate, Utc};
use log::debug;
use rust_decimal::Decimal;
use std::sync::Arc;

use super::summary_model::{
    summarize_balances, summarize_by_category, summarize_by_month, BalanceSheet, CategorySummary,
    DateRange, MonthlySummary,
};
use crate::accounts::{AccountFilter, AccountRepositoryTrait};
use crate::categories::CategoryRepositoryTrait;
use crate::errors::Result;
use crate::fx::{normalize_currency_code, FxServiceTrait};
use crate::transactions::TransactionRepositoryTrait;

pub trait SummaryServiceTrait: Send + Sync {
    /// Every account with its natural balance, converted at today's rates.
    fn balance_sheet(&self, reporting_currency: &str) -> Result<BalanceSheet>;

    /// Totals per top-level category, converted at each transaction's date.
    fn category_summary(
        &self,
        range: &DateRange,
        reporting_currency: &str,
    ) -> Result<CategorySummary>;

    fn monthly_totals(&self, range: &DateRange, reporting_currency: &str)
        -> Result<MonthlySummary>;
}

pub struct SummaryService {
    account_repository: Arc<dyn AccountRepositoryTrait>,
    transaction_repository: Arc<dyn TransactionRepositoryTrait>,
    category_repository: Arc<dyn CategoryRepositoryTrait>,
    fx_service: Arc<dyn FxServiceTrait>,
}

impl SummaryService {
    pub fn new(
        account_repository: Arc<dyn AccountRepositoryTrait>,
        transaction_repository: Arc<dyn TransactionRepositoryTrait>,
        category_repository: Arc<dyn CategoryRepositoryTrait>,
        fx_service: Arc<dyn FxServiceTrait>,
    ) -> Self {
        Self {
            account_repository,
            transaction_repository,
            category_repository,
            fx_service,
        }
    }

    fn converter<'a>(
        &'a self,
        reporting_currency: &'a str,
    ) -> impl Fn(Decimal, &str, NaiveDate) -> Result<Decimal> + 'a {
        move |amount, currency, on| {
            self.fx_service
                .convert(amount, currency, reporting_currency, on)
        }
    }
}

impl SummaryServiceTrait for SummaryService {
    fn balance_sheet(&self, reporting_currency: &str) -> Result<BalanceSheet> {
        let reporting_currency = normalize_currency_code(reporting_currency)?;
        let accounts = self.account_repository.list(&AccountFilter::default())?;
        let today = Utc::now().date_naive();
        let sheet = summarize_balances(
            accounts,
            &reporting_currency,
            today,
            self.converter(&reporting_currency),
        )?;
        if !sheet.unconverted.is_empty() {
            debug!(
                "{} accounts have no {} rate on {}",
                sheet.unconverted.len(),
                reporting_currency,
                today
            );
        }
        Ok(sheet)
    }

    fn category_summary(
        &self,
        range: &DateRange,
        reporting_currency: &str,
    ) -> Result<CategorySummary> {
        let reporting_currency = normalize_currency_code(reporting_currency)?;
        let transactions = self
            .transaction_repository
            .list_in_range(range.from, range.to)?;
        let categories = self.category_repository.list()?;
        let (totals, unconverted) = summarize_by_category(
            &transactions,
            &categories,
            self.converter(&reporting_currency),
        )?;
        Ok(CategorySummary {
            reporting_currency,
            range: *range,
            totals,
            unconverted,
        })
    }

    fn monthly_totals(
        &self,
        range: &DateRange,
        reporting_currency: &str,
    ) -> Result<MonthlySummary> {
        let reporting_currency = normalize_currency_code(reporting_currency)?;
        let transactions = self
            .transaction_repository
            .list_in_range(range.from, range.to)?;
        let (months, unconverted) =
            summarize_by_month(&transactions, self.converter(&reporting_currency))?;
        Ok(MonthlySummary {
            reporting_currency,
            range: *range,
            months,
            unconverted,
        })
    }
}
