//! Shared test utilities for the ledger.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    config::MonthlyDueRule,
    core::{
        collector::{self, NewCollector},
        customer::{self, NewCustomer},
        deposit::{self, DepositReceipt, RecordDeposit},
        plan::{self, NewPlan},
    },
    entities::{self, AccountType, DepositFrequency, PaymentMethod},
    errors::Result,
};
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;

pub use rust_decimal_macros::dec;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// A fixed UTC instant, for schedule-sensitive tests.
#[allow(clippy::unwrap_used)]
pub fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
}

/// Plan input with sensible defaults: daily, 12 months, 4% interest.
pub fn daily_plan_input(deposit_amount: Decimal) -> NewPlan {
    NewPlan {
        name: format!("Daily {deposit_amount}"),
        deposit_frequency: DepositFrequency::Daily,
        deposit_amount,
        duration_months: 12,
        interest_rate: dec!(4),
        maturity_amount: deposit_amount * dec!(370),
    }
}

/// Creates a 12 month plan with the given frequency and deposit amount.
pub async fn create_test_plan(
    db: &DatabaseConnection,
    deposit_frequency: DepositFrequency,
    deposit_amount: Decimal,
) -> Result<entities::plan::Model> {
    let mut input = daily_plan_input(deposit_amount);
    input.name = format!("{deposit_frequency:?} {deposit_amount}");
    input.deposit_frequency = deposit_frequency;
    plan::create_plan(db, input).await
}

/// Creates a collector whose email is derived from the name.
pub async fn create_test_collector(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::collector::Model> {
    collector::create_collector(
        db,
        NewCollector {
            name: name.to_string(),
            email: format!("{}@collect.test", name.to_lowercase()),
            phone: "9000000000".to_string(),
            area: Some("Ward 4".to_string()),
            password_hash: "hash".to_string(),
        },
    )
    .await
}

/// Creates a daily-collection customer whose email is derived from the name.
pub async fn create_test_customer(
    db: &DatabaseConnection,
    name: &str,
    package_id: i64,
    collector_id: Option<i64>,
) -> Result<entities::customer::Model> {
    customer::create_customer(
        db,
        NewCustomer {
            name: name.to_string(),
            email: format!("{}@customer.test", name.to_lowercase()),
            phone: "9800000000".to_string(),
            address: "12 Market Road".to_string(),
            password_hash: "hash".to_string(),
            account_type: AccountType::Daily,
            package_id,
            collector_id,
        },
    )
    .await
}

/// Sets up a plan, a collector and one customer assigned to that collector.
/// Returns (db, plan, collector, customer).
pub async fn setup_with_customer(
    deposit_frequency: DepositFrequency,
    deposit_amount: Decimal,
) -> Result<(
    DatabaseConnection,
    entities::plan::Model,
    entities::collector::Model,
    entities::customer::Model,
)> {
    let db = setup_test_db().await?;
    let plan = create_test_plan(&db, deposit_frequency, deposit_amount).await?;
    let collector = create_test_collector(&db, "Ravi").await?;
    let customer = create_test_customer(&db, "Asha", plan.id, Some(collector.id)).await?;
    Ok((db, plan, collector, customer))
}

/// An in-hand regular deposit request.
pub fn in_hand() -> RecordDeposit {
    RecordDeposit {
        payment_method: PaymentMethod::InHand,
        reference_id: None,
        clear_dues_amount: None,
    }
}

/// An online regular deposit request.
pub fn online(reference: &str) -> RecordDeposit {
    RecordDeposit {
        payment_method: PaymentMethod::Online,
        reference_id: Some(reference.to_string()),
        clear_dues_amount: None,
    }
}

/// Records a deposit with the default monthly rule.
pub async fn record_at(
    db: &DatabaseConnection,
    customer_id: i64,
    request: RecordDeposit,
    now: DateTime<Utc>,
) -> Result<DepositReceipt> {
    deposit::record_deposit(db, customer_id, request, now, MonthlyDueRule::AlwaysDue).await
}

/// Credits `amount` through an online dues-clearance deposit, leaving
/// `last_deposit_date` alone.
pub async fn fund_customer(
    db: &DatabaseConnection,
    customer_id: i64,
    amount: Decimal,
) -> Result<DepositReceipt> {
    let mut request = online("FUND");
    request.clear_dues_amount = Some(amount);
    record_at(db, customer_id, request, Utc::now()).await
}
