//! Deposit lifecycle - recording, approval, rejection and deletion.
//!
//! Every operation here runs in one database transaction. Status changes are
//! compare-and-swap updates filtered on the status and `balance_updated`
//! latch the operation read, so two actors racing on the same deposit can
//! never both succeed. The latch is the only thing deciding whether a
//! balance change happens:
//!
//! - credit the balance only when the latch is clear, then set it
//! - reverse the balance only when the latch is set, then clear it
//!
//! which keeps `balance` equal to the sum of approved, latched deposits
//! minus approved withdrawals.

use crate::{
    config::{AdminRejectGate, MonthlyDueRule},
    core::{assignment, customer, plan, schedule},
    entities::{Deposit, DepositStatus, DepositType, PaymentMethod, deposit},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};

/// Customer input for recording a deposit.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDeposit {
    pub payment_method: PaymentMethod,
    /// Payment reference; required for online payments only
    #[serde(default)]
    pub reference_id: Option<String>,
    /// Positive amount marks a dues-clearance deposit
    #[serde(default)]
    pub clear_dues_amount: Option<Decimal>,
}

impl RecordDeposit {
    /// Checks the payload shape before anything is read or written.
    pub fn validate(&self) -> Result<()> {
        let has_reference = self
            .reference_id
            .as_deref()
            .is_some_and(|r| !r.trim().is_empty());
        match self.payment_method {
            PaymentMethod::Online if !has_reference => {
                return Err(Error::validation(
                    "Reference id is required for online payments",
                ));
            }
            PaymentMethod::InHand if has_reference => {
                return Err(Error::validation(
                    "Reference id is only accepted for online payments",
                ));
            }
            _ => {}
        }

        match self.clear_dues_amount {
            Some(amount) if amount < Decimal::ZERO => Err(Error::validation(
                "Clear-dues amount cannot be negative",
            )),
            _ => Ok(()),
        }
    }

    fn dues_amount(&self) -> Option<Decimal> {
        self.clear_dues_amount.filter(|amount| *amount > Decimal::ZERO)
    }
}

/// Result of recording a deposit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepositReceipt {
    pub deposit: deposit::Model,
    /// New balance when the deposit was credited immediately
    pub balance: Option<Decimal>,
}

/// Collector decision on the generic status-update path.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositDecision {
    pub status: DepositStatus,
    #[serde(default)]
    pub reason: Option<String>,
}

pub async fn get_deposit_by_id<C>(db: &C, deposit_id: i64) -> Result<Option<deposit::Model>>
where
    C: ConnectionTrait,
{
    Deposit::find_by_id(deposit_id)
        .one(db)
        .await
        .map_err(Into::into)
}

pub async fn require_deposit<C>(db: &C, deposit_id: i64) -> Result<deposit::Model>
where
    C: ConnectionTrait,
{
    get_deposit_by_id(db, deposit_id)
        .await?
        .ok_or_else(|| Error::not_found("Deposit", deposit_id))
}

/// All deposits of a customer, newest first.
pub async fn deposits_for_customer(
    db: &DatabaseConnection,
    customer_id: i64,
) -> Result<Vec<deposit::Model>> {
    Deposit::find()
        .filter(deposit::Column::CustomerId.eq(customer_id))
        .order_by_desc(deposit::Column::DepositDate)
        .order_by_desc(deposit::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Pending deposits of every customer assigned to the collector, oldest first.
pub async fn pending_deposits_for_collector(
    db: &DatabaseConnection,
    collector_id: i64,
) -> Result<Vec<deposit::Model>> {
    let customer_ids = assignment::assigned_customer_ids(db, collector_id).await?;
    Deposit::find()
        .filter(deposit::Column::CustomerId.is_in(customer_ids))
        .filter(deposit::Column::Status.eq(DepositStatus::Pending))
        .order_by_asc(deposit::Column::DepositDate)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Applies `changes` only if the deposit still has the status and latch it
/// had when `current` was read.
async fn transition<C>(
    db: &C,
    current: &deposit::Model,
    action: &'static str,
    changes: deposit::ActiveModel,
) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = Deposit::update_many()
        .set(changes)
        .filter(deposit::Column::Id.eq(current.id))
        .filter(deposit::Column::Status.eq(current.status))
        .filter(deposit::Column::BalanceUpdated.eq(current.balance_updated))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::StateConflict {
            entity: "Deposit",
            id: current.id,
            action,
            reason: "it was changed by another request".to_string(),
        });
    }
    Ok(())
}

fn conflict(deposit: &deposit::Model, action: &'static str, reason: impl Into<String>) -> Error {
    Error::StateConflict {
        entity: "Deposit",
        id: deposit.id,
        action,
        reason: reason.into(),
    }
}

/// Records a deposit for the customer at `now`.
///
/// Without a positive `clear_dues_amount` this is a regular deposit of the
/// plan amount and is refused unless one is due. A positive
/// `clear_dues_amount` records a dues-clearance deposit of that amount and
/// skips the schedule check.
///
/// Online deposits are approved and credited immediately; a regular online
/// deposit also moves `last_deposit_date` to `now`. In-hand deposits wait
/// for collector approval and change nothing on the customer.
pub async fn record_deposit(
    db: &DatabaseConnection,
    customer_id: i64,
    request: RecordDeposit,
    now: DateTime<Utc>,
    monthly_rule: MonthlyDueRule,
) -> Result<DepositReceipt> {
    request.validate()?;

    let txn = db.begin().await?;

    let customer = customer::require_customer(&txn, customer_id).await?;
    customer::ensure_open(&customer)?;
    let plan = plan::get_plan_by_id(&txn, customer.package_id)
        .await?
        .ok_or_else(|| Error::not_found("Plan", customer.package_id))?;

    let (amount, deposit_type) = match request.dues_amount() {
        Some(amount) => (amount, DepositType::DuesClearance),
        None => {
            let last = customer.last_deposit_date;
            let frequency = plan.deposit_frequency;
            if !schedule::is_deposit_due(frequency, last, now, monthly_rule) {
                return Err(Error::DepositNotDue {
                    customer_id,
                    next_due: schedule::next_due_date(frequency, last, now, monthly_rule),
                });
            }
            (plan.deposit_amount, DepositType::Regular)
        }
    };

    let payment_method = request.payment_method;
    let online = payment_method == PaymentMethod::Online;
    let deposit = deposit::ActiveModel {
        customer_id: Set(customer.id),
        plan_id: Set(plan.id),
        collector_id: Set(customer.collector_id),
        amount: Set(amount),
        payment_method: Set(payment_method),
        reference_id: Set(request.reference_id.map(|r| r.trim().to_string())),
        deposit_date: Set(now),
        deposit_type: Set(deposit_type),
        status: Set(payment_method.initial_status()),
        approved_by: Set(None),
        approved_at: Set(online.then_some(now)),
        rejected_reason: Set(None),
        balance_updated: Set(online),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let balance = if online {
        let updated = customer::apply_balance_delta(&txn, customer.id, amount).await?;
        if deposit_type == DepositType::Regular {
            customer::set_last_deposit_date(&txn, customer.id, now).await?;
        }
        Some(updated.balance)
    } else {
        None
    };

    txn.commit().await?;

    tracing::info!(
        "Recorded {:?} {:?} deposit {} of {} for customer {}",
        deposit_type,
        payment_method,
        deposit.id,
        amount,
        customer_id
    );
    Ok(DepositReceipt { deposit, balance })
}

/// Collector approval of a pending deposit.
///
/// The customer must be assigned to the collector. The balance is credited
/// only if the deposit has not been credited before. For a regular deposit
/// `last_deposit_date` advances to the deposit date, never backwards.
pub async fn approve_deposit(
    db: &DatabaseConnection,
    collector_id: i64,
    deposit_id: i64,
) -> Result<deposit::Model> {
    const ACTION: &str = "approve";
    let txn = db.begin().await?;

    let deposit = require_deposit(&txn, deposit_id).await?;
    assignment::ensure_assigned(&txn, collector_id, deposit.customer_id).await?;
    if deposit.status != DepositStatus::Pending {
        return Err(conflict(&deposit, ACTION, "it is not pending"));
    }

    let now = Utc::now();
    transition(
        &txn,
        &deposit,
        ACTION,
        deposit::ActiveModel {
            status: Set(DepositStatus::Approved),
            approved_by: Set(Some(collector_id)),
            approved_at: Set(Some(now)),
            rejected_reason: Set(None),
            balance_updated: Set(true),
            ..Default::default()
        },
    )
    .await?;

    if !deposit.balance_updated {
        customer::apply_balance_delta(&txn, deposit.customer_id, deposit.amount).await?;
    }

    if deposit.deposit_type == DepositType::Regular {
        let current = customer::require_customer(&txn, deposit.customer_id).await?;
        if current
            .last_deposit_date
            .is_none_or(|last| last < deposit.deposit_date)
        {
            customer::set_last_deposit_date(&txn, deposit.customer_id, deposit.deposit_date)
                .await?;
        }
    }

    let approved = require_deposit(&txn, deposit_id).await?;
    txn.commit().await?;

    tracing::info!("Collector {} approved deposit {}", collector_id, deposit_id);
    Ok(approved)
}

/// Generic collector status update of a pending deposit.
///
/// Authorization is the same assignment check as [`approve_deposit`]. On
/// approval `last_deposit_date` of a regular deposit is overwritten with the
/// deposit date, even when a later regular deposit already landed. Rejection
/// of a pending deposit never touches the balance.
pub async fn update_deposit_status(
    db: &DatabaseConnection,
    collector_id: i64,
    deposit_id: i64,
    decision: DepositDecision,
) -> Result<deposit::Model> {
    const ACTION: &str = "update the status of";
    if decision.status == DepositStatus::Pending {
        return Err(Error::validation("Status must be approved or rejected"));
    }

    let txn = db.begin().await?;

    let deposit = require_deposit(&txn, deposit_id).await?;
    assignment::ensure_assigned(&txn, collector_id, deposit.customer_id).await?;
    if deposit.status != DepositStatus::Pending {
        return Err(conflict(&deposit, ACTION, "it is not pending"));
    }

    if decision.status == DepositStatus::Approved {
        transition(
            &txn,
            &deposit,
            ACTION,
            deposit::ActiveModel {
                status: Set(DepositStatus::Approved),
                approved_by: Set(Some(collector_id)),
                approved_at: Set(Some(Utc::now())),
                balance_updated: Set(true),
                ..Default::default()
            },
        )
        .await?;

        if !deposit.balance_updated {
            customer::apply_balance_delta(&txn, deposit.customer_id, deposit.amount).await?;
        }
        if deposit.deposit_type == DepositType::Regular {
            customer::set_last_deposit_date(&txn, deposit.customer_id, deposit.deposit_date)
                .await?;
        }
    } else {
        transition(
            &txn,
            &deposit,
            ACTION,
            deposit::ActiveModel {
                status: Set(DepositStatus::Rejected),
                rejected_reason: Set(decision.reason),
                ..Default::default()
            },
        )
        .await?;
    }

    let updated = require_deposit(&txn, deposit_id).await?;
    txn.commit().await?;

    tracing::info!(
        "Collector {} set deposit {} to {:?}",
        collector_id,
        deposit_id,
        updated.status
    );
    Ok(updated)
}

/// Moves the deposit to rejected, reversing its credit if it has one.
async fn reject_and_reverse<C>(
    db: &C,
    deposit: &deposit::Model,
    action: &'static str,
    reason: Option<String>,
) -> Result<()>
where
    C: ConnectionTrait,
{
    transition(
        db,
        deposit,
        action,
        deposit::ActiveModel {
            status: Set(DepositStatus::Rejected),
            approved_by: Set(None),
            approved_at: Set(None),
            rejected_reason: Set(reason),
            balance_updated: Set(false),
            ..Default::default()
        },
    )
    .await?;

    if deposit.balance_updated {
        customer::apply_balance_delta(db, deposit.customer_id, -deposit.amount).await?;
    }
    Ok(())
}

/// Collector rejection of a pending or approved deposit.
///
/// An approved deposit that was credited has the credit reversed.
pub async fn reject_deposit(
    db: &DatabaseConnection,
    collector_id: i64,
    deposit_id: i64,
    reason: Option<String>,
) -> Result<deposit::Model> {
    const ACTION: &str = "reject";
    let txn = db.begin().await?;

    let deposit = require_deposit(&txn, deposit_id).await?;
    assignment::ensure_assigned(&txn, collector_id, deposit.customer_id).await?;
    if deposit.status == DepositStatus::Rejected {
        return Err(conflict(&deposit, ACTION, "it is already rejected"));
    }

    reject_and_reverse(&txn, &deposit, ACTION, reason).await?;

    let rejected = require_deposit(&txn, deposit_id).await?;
    txn.commit().await?;

    tracing::info!("Collector {} rejected deposit {}", collector_id, deposit_id);
    Ok(rejected)
}

/// Whether an administrator may reject `deposit` under `gate`.
///
/// The literal gate only admits deposits that are neither approved nor paid
/// online. It is suspected to be inverted and is kept pending product
/// clarification.
#[must_use]
pub fn admin_may_reject(deposit: &deposit::Model, gate: AdminRejectGate) -> bool {
    if deposit.status == DepositStatus::Rejected {
        return false;
    }
    match gate {
        AdminRejectGate::Literal => {
            deposit.status != DepositStatus::Approved
                && deposit.payment_method != PaymentMethod::Online
        }
        AdminRejectGate::Corrected => true,
    }
}

/// Administrator rejection of a deposit. No assignment check applies.
///
/// A credit is reversed only when the deposit carries one.
pub async fn reject_deposit_admin(
    db: &DatabaseConnection,
    admin_id: i64,
    deposit_id: i64,
    reason: Option<String>,
    gate: AdminRejectGate,
) -> Result<deposit::Model> {
    const ACTION: &str = "reject";
    let txn = db.begin().await?;

    let deposit = require_deposit(&txn, deposit_id).await?;
    if !admin_may_reject(&deposit, gate) {
        let why = if deposit.status == DepositStatus::Rejected {
            "it is already rejected"
        } else {
            "administrators may only reject unapproved in-hand deposits"
        };
        return Err(conflict(&deposit, ACTION, why));
    }

    reject_and_reverse(&txn, &deposit, ACTION, reason).await?;

    let rejected = require_deposit(&txn, deposit_id).await?;
    txn.commit().await?;

    tracing::info!("Admin {} rejected deposit {}", admin_id, deposit_id);
    Ok(rejected)
}

/// Collector deletion of a deposit.
///
/// A credited deposit has its credit reversed before the record is removed.
pub async fn delete_deposit(
    db: &DatabaseConnection,
    collector_id: i64,
    deposit_id: i64,
) -> Result<deposit::Model> {
    const ACTION: &str = "delete";
    let txn = db.begin().await?;

    let deposit = require_deposit(&txn, deposit_id).await?;
    assignment::ensure_assigned(&txn, collector_id, deposit.customer_id).await?;

    let result = Deposit::delete_many()
        .filter(deposit::Column::Id.eq(deposit.id))
        .filter(deposit::Column::Status.eq(deposit.status))
        .filter(deposit::Column::BalanceUpdated.eq(deposit.balance_updated))
        .exec(&txn)
        .await?;
    if result.rows_affected == 0 {
        return Err(conflict(
            &deposit,
            ACTION,
            "it was changed by another request",
        ));
    }

    if deposit.balance_updated {
        customer::apply_balance_delta(&txn, deposit.customer_id, -deposit.amount).await?;
    }

    txn.commit().await?;

    tracing::info!("Collector {} deleted deposit {}", collector_id, deposit_id);
    Ok(deposit)
}
