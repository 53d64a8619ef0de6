//! Customer accounts and the balance primitives.
//!
//! Account creation fixes the maturity date from the plan duration. The two
//! balance primitives at the bottom of this module are the only code that
//! writes `customers.balance`. Both compute in `Decimal` and write with a
//! compare-and-swap on the balance they read, so concurrent writers never
//! overwrite each other.

use crate::{
    core::{collector, plan},
    entities::{AccountStatus, AccountType, Customer, customer},
    errors::{Error, Result},
};
use chrono::Months;
use rand::Rng;
use rust_decimal::Decimal;
use sea_orm::{Set, TransactionTrait, prelude::*, sea_query::Expr};

const ACCOUNT_NUMBER_ATTEMPTS: usize = 5;

/// Input for a new customer account.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    /// Hash produced by the authentication layer
    pub password_hash: String,
    pub account_type: AccountType,
    /// Plan to enroll in; must be active
    pub package_id: i64,
    pub collector_id: Option<i64>,
}

fn generate_account_number() -> String {
    let digits: u64 = rand::thread_rng().gen_range(0..10_000_000_000);
    format!("PG{digits:010}")
}

/// Opens a new account with a zero balance.
///
/// The plan must exist and be active, and the collector, when given, must
/// exist. The maturity date is the start date plus the plan duration.
pub async fn create_customer(
    db: &DatabaseConnection,
    new_customer: NewCustomer,
) -> Result<customer::Model> {
    if new_customer.name.trim().is_empty() {
        return Err(Error::validation("Customer name cannot be empty"));
    }
    if !new_customer.email.contains('@') {
        return Err(Error::validation("Customer email is not valid"));
    }
    if new_customer.phone.trim().is_empty() {
        return Err(Error::validation("Customer phone cannot be empty"));
    }

    let txn = db.begin().await?;

    let plan = plan::get_plan_by_id(&txn, new_customer.package_id)
        .await?
        .ok_or_else(|| Error::not_found("Plan", new_customer.package_id))?;
    if !plan.is_active {
        return Err(Error::validation(format!(
            "Plan '{}' is not open for enrollment",
            plan.name
        )));
    }

    if let Some(collector_id) = new_customer.collector_id {
        collector::require_collector(&txn, collector_id).await?;
    }

    let mut account_number = None;
    for _ in 0..ACCOUNT_NUMBER_ATTEMPTS {
        let candidate = generate_account_number();
        let taken = Customer::find()
            .filter(customer::Column::AccountNumber.eq(candidate.as_str()))
            .one(&txn)
            .await?
            .is_some();
        if !taken {
            account_number = Some(candidate);
            break;
        }
    }
    let account_number = account_number.ok_or_else(|| Error::Config {
        message: "Could not allocate a unique account number".to_string(),
    })?;

    let months = u32::try_from(plan.duration_months)
        .map_err(|_| Error::validation("Plan duration is out of range"))?;
    let start_date = chrono::Utc::now();
    let maturity_date = start_date
        .checked_add_months(Months::new(months))
        .ok_or_else(|| Error::validation("Maturity date is out of range"))?;

    let customer = customer::ActiveModel {
        name: Set(new_customer.name.trim().to_string()),
        email: Set(new_customer.email.trim().to_lowercase()),
        phone: Set(new_customer.phone.trim().to_string()),
        address: Set(new_customer.address),
        password_hash: Set(new_customer.password_hash),
        account_number: Set(account_number),
        account_type: Set(new_customer.account_type),
        package_id: Set(plan.id),
        collector_id: Set(new_customer.collector_id),
        balance: Set(Decimal::ZERO),
        last_deposit_date: Set(None),
        start_date: Set(start_date),
        maturity_date: Set(maturity_date),
        is_closed: Set(false),
        status: Set(AccountStatus::Active),
        kyc_docs: Set(None),
        profile_image: Set(None),
        created_at: Set(start_date),
        ..Default::default()
    };

    let result = customer.insert(&txn).await?;
    txn.commit().await?;

    tracing::info!(
        "Opened account {} for customer {} on plan {}",
        result.account_number,
        result.id,
        result.package_id
    );
    Ok(result)
}

pub async fn get_customer_by_id<C>(db: &C, customer_id: i64) -> Result<Option<customer::Model>>
where
    C: ConnectionTrait,
{
    Customer::find_by_id(customer_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Like [`get_customer_by_id`] but a missing customer is an error.
pub async fn require_customer<C>(db: &C, customer_id: i64) -> Result<customer::Model>
where
    C: ConnectionTrait,
{
    get_customer_by_id(db, customer_id)
        .await?
        .ok_or_else(|| Error::not_found("Customer", customer_id))
}

pub async fn get_customer_by_account_number(
    db: &DatabaseConnection,
    account_number: &str,
) -> Result<Option<customer::Model>> {
    Customer::find()
        .filter(customer::Column::AccountNumber.eq(account_number))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Closes an account. Closed accounts refuse deposits and withdrawal
/// requests; the balance is left as is for settlement.
pub async fn close_account(db: &DatabaseConnection, customer_id: i64) -> Result<customer::Model> {
    let customer = require_customer(db, customer_id).await?;
    ensure_open(&customer)?;

    let mut active: customer::ActiveModel = customer.into();
    active.is_closed = Set(true);
    active.status = Set(AccountStatus::Closed);
    let result = active.update(db).await?;
    tracing::info!("Closed account {}", result.account_number);
    Ok(result)
}

/// Fails with a state conflict when the account is closed.
pub(crate) fn ensure_open(customer: &customer::Model) -> Result<()> {
    if customer.is_closed || customer.status == AccountStatus::Closed {
        return Err(Error::StateConflict {
            entity: "Customer",
            id: customer.id,
            action: "transact on",
            reason: "account is closed".to_string(),
        });
    }
    Ok(())
}

/// Writes `new_balance` only if the stored balance is still `expected`:
/// `UPDATE customers SET balance = ? WHERE id = ? AND balance = ?`
///
/// The arithmetic stays in `Decimal`; the database only ever sees whole
/// values, so no rounding from SQL-side arithmetic creeps in.
async fn swap_balance<C>(
    db: &C,
    customer_id: i64,
    expected: Decimal,
    new_balance: Decimal,
) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = Customer::update_many()
        .col_expr(customer::Column::Balance, Expr::value(new_balance))
        .filter(customer::Column::Id.eq(customer_id))
        .filter(customer::Column::Balance.eq(expected))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::StateConflict {
            entity: "Customer",
            id: customer_id,
            action: "update the balance of",
            reason: "it was changed by another request".to_string(),
        });
    }
    Ok(())
}

/// Adds `amount_delta` to the customer balance.
///
/// Use a negative delta to reverse a credit. Returns the updated customer.
pub(crate) async fn apply_balance_delta<C>(
    db: &C,
    customer_id: i64,
    amount_delta: Decimal,
) -> Result<customer::Model>
where
    C: ConnectionTrait,
{
    let current = require_customer(db, customer_id).await?;
    swap_balance(db, customer_id, current.balance, current.balance + amount_delta).await?;

    tracing::info!("Balance of customer {} changed by {:+}", customer_id, amount_delta);
    require_customer(db, customer_id).await
}

/// Debits `amount` only if the balance still covers it.
///
/// Returns `Ok(false)` without changing anything when the balance is short.
pub(crate) async fn debit_if_covered<C>(
    db: &C,
    customer_id: i64,
    amount: Decimal,
) -> Result<bool>
where
    C: ConnectionTrait,
{
    let current = require_customer(db, customer_id).await?;
    if current.balance < amount {
        return Ok(false);
    }
    swap_balance(db, customer_id, current.balance, current.balance - amount).await?;

    tracing::info!("Balance of customer {} changed by {:+}", customer_id, -amount);
    Ok(true)
}

/// Overwrites `last_deposit_date`.
pub(crate) async fn set_last_deposit_date<C>(
    db: &C,
    customer_id: i64,
    date: chrono::DateTime<chrono::Utc>,
) -> Result<()>
where
    C: ConnectionTrait,
{
    Customer::update_many()
        .col_expr(customer::Column::LastDepositDate, Expr::value(date))
        .filter(customer::Column::Id.eq(customer_id))
        .exec(db)
        .await?;
    Ok(())
}
