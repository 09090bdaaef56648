//! Summary module - balance sheet, category and monthly totals.

mod summary_model;
mod summary_service;

#[cfg(test)]
mod summary_tests;

pub use summary_model::{
    summarize_balances, summarize_by_category, summarize_by_month, AccountBalance, BalanceSheet,
    CategorySummary, CategoryTotal, ConvertedTypeTotal, DateRange, MonthlySummary, MonthlyTotal,
    TypeTotal,
};
pub use summary_service::{SummaryService, SummaryServiceTrait};
