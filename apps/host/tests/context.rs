use std::collections::HashMap;
use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tempfile::{tempdir, TempDir};
use tokio::time::timeout;

use ledgerbook_core::accounts::{AccountType, NewAccount};
use ledgerbook_core::categories::NewCategory;
use ledgerbook_core::entries::NewEntry;
use ledgerbook_core::fx::NewExchangeRate;
use ledgerbook_core::summary::BalanceSheet;
use ledgerbook_core::transactions::NewTransaction;
use ledgerbook_host::{build_context, AppContext, Config};

async fn context() -> (AppContext, TempDir) {
    let dir = tempdir().unwrap();
    let vars: HashMap<&str, String> = HashMap::from([
        ("LB_DATA_DIR", dir.path().to_string_lossy().into_owned()),
        ("LB_BASE_CURRENCY", "eur".to_string()),
    ]);
    let config = Config::from_lookup(|key| vars.get(key).cloned()).unwrap();
    let ctx = build_context(&config).await.unwrap();
    (ctx, dir)
}

async fn account(ctx: &AppContext, id: &str, account_type: AccountType, currency: &str) {
    ctx.account_service
        .create_account(NewAccount {
            id: Some(id.to_string()),
            name: id.to_string(),
            account_type,
            currency: currency.to_string(),
        })
        .await
        .unwrap();
}

fn entry(account: &str, amount: Decimal) -> NewEntry {
    NewEntry {
        account_id: Some(account.to_string()),
        currency: Some("EUR".to_string()),
        amount,
        recorded_at: None,
        reference: None,
    }
}

fn natural_balance(sheet: &BalanceSheet, account_id: &str) -> Decimal {
    sheet
        .accounts
        .iter()
        .find(|b| b.account.id == account_id)
        .map(|b| b.natural_balance)
        .unwrap()
}

#[tokio::test]
async fn test_context_opens_database_in_data_dir() {
    let (ctx, dir) = context().await;
    assert!(ctx.db_path.starts_with(&*dir.path().to_string_lossy()));
    assert_eq!(ctx.base_currency, "EUR");
    assert!(std::path::Path::new(&ctx.db_path).exists());
    assert!(ctx.health_service.check().unwrap().is_consistent());
}

#[tokio::test]
async fn test_balance_sheet_follows_bookings_and_rates() {
    let (ctx, _dir) = context().await;
    account(&ctx, "wallet", AccountType::Cash, "EUR").await;
    account(&ctx, "food", AccountType::Expense, "EUR").await;
    account(&ctx, "dollars", AccountType::Cash, "USD").await;
    ctx.category_service
        .create_category(NewCategory {
            id: Some("groceries".to_string()),
            name: "Groceries".to_string(),
            parent_id: None,
        })
        .await
        .unwrap();

    let mut sheets = ctx.watch_balance_sheet().unwrap();
    assert_eq!(sheets.borrow_and_update().reporting_currency, "EUR");
    assert_eq!(natural_balance(&sheets.borrow(), "wallet"), Decimal::ZERO);

    ctx.transaction_service
        .create_transaction(NewTransaction {
            id: None,
            category_id: Some("groceries".to_string()),
            description: "Market".to_string(),
            details: None,
            currency: Some("EUR".to_string()),
            incurred_at: NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            entries: vec![entry("food", dec!(20)), entry("wallet", dec!(-20))],
        })
        .await
        .unwrap();

    timeout(Duration::from_secs(5), sheets.changed())
        .await
        .expect("balance sheet did not refresh")
        .unwrap();
    {
        let sheet = sheets.borrow_and_update();
        assert_eq!(natural_balance(&sheet, "wallet"), dec!(-20));
        assert_eq!(natural_balance(&sheet, "food"), dec!(20));
    }

    ctx.fx_service
        .upsert_rate(NewExchangeRate {
            base_currency: "USD".to_string(),
            counter_currency: "EUR".to_string(),
            rate: dec!(0.9),
            since: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        })
        .await
        .unwrap();

    timeout(Duration::from_secs(5), sheets.changed())
        .await
        .expect("balance sheet did not refresh after the rate change")
        .unwrap();
    let sheet = sheets.borrow_and_update().clone();
    let dollars = sheet
        .accounts
        .iter()
        .find(|b| b.account.id == "dollars")
        .unwrap();
    assert!(dollars.converted_balance.is_some());
    assert!(sheet.unconverted.is_empty());

    assert!(ctx.health_service.check().unwrap().is_consistent());
}
