//! Read-only reporting over the ledger.
//!
//! Nothing here writes. [`reconcile_customer_balance`] recomputes a balance
//! from the records that justify it, which is how drift from the stored
//! running total is detected.

use crate::{
    core::{assignment, customer},
    entities::{
        Deposit, DepositStatus, WithdrawalRequest, WithdrawalStatus, deposit, withdrawal_request,
    },
    errors::Result,
};
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, prelude::*};
use serde::Serialize;

/// Stored balance next to the balance implied by the records.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceReconciliation {
    pub customer_id: i64,
    /// `customers.balance`
    pub recorded_balance: Decimal,
    /// Approved, credited deposits
    pub credited_deposits: Decimal,
    /// Approved withdrawals
    pub approved_withdrawals: Decimal,
    /// `credited_deposits - approved_withdrawals`
    pub derived_balance: Decimal,
    /// `recorded_balance - derived_balance`
    pub drift: Decimal,
}

impl BalanceReconciliation {
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.drift.is_zero()
    }
}

/// Recomputes a customer's balance from deposits and withdrawals.
pub async fn reconcile_customer_balance<C>(
    db: &C,
    customer_id: i64,
) -> Result<BalanceReconciliation>
where
    C: ConnectionTrait,
{
    let customer = customer::require_customer(db, customer_id).await?;

    let credited_deposits: Decimal = Deposit::find()
        .filter(deposit::Column::CustomerId.eq(customer_id))
        .filter(deposit::Column::Status.eq(DepositStatus::Approved))
        .filter(deposit::Column::BalanceUpdated.eq(true))
        .all(db)
        .await?
        .iter()
        .map(|d| d.amount)
        .sum();

    let approved_withdrawals: Decimal = WithdrawalRequest::find()
        .filter(withdrawal_request::Column::CustomerId.eq(customer_id))
        .filter(withdrawal_request::Column::Status.eq(WithdrawalStatus::Approved))
        .all(db)
        .await?
        .iter()
        .map(|w| w.amount)
        .sum();

    let derived_balance = credited_deposits - approved_withdrawals;
    let reconciliation = BalanceReconciliation {
        customer_id,
        recorded_balance: customer.balance,
        credited_deposits,
        approved_withdrawals,
        derived_balance,
        drift: customer.balance - derived_balance,
    };

    if !reconciliation.is_consistent() {
        tracing::warn!(
            "Balance drift of {:+} on customer {}",
            reconciliation.drift,
            customer_id
        );
    }
    Ok(reconciliation)
}

/// Outstanding work of one collector.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectorWorkload {
    pub collector_id: i64,
    pub assigned_customers: usize,
    pub pending_deposits: usize,
    pub pending_deposit_amount: Decimal,
    pub pending_withdrawals: usize,
    pub pending_withdrawal_amount: Decimal,
}

pub async fn collector_workload(
    db: &DatabaseConnection,
    collector_id: i64,
) -> Result<CollectorWorkload> {
    let assigned = assignment::assigned_customer_ids(db, collector_id).await?;
    let deposits = crate::core::deposit::pending_deposits_for_collector(db, collector_id).await?;
    let withdrawals =
        crate::core::withdrawal::pending_withdrawals_for_collector(db, collector_id).await?;

    Ok(CollectorWorkload {
        collector_id,
        assigned_customers: assigned.len(),
        pending_deposits: deposits.len(),
        pending_deposit_amount: deposits.iter().map(|d| d.amount).sum(),
        pending_withdrawals: withdrawals.len(),
        pending_withdrawal_amount: withdrawals.iter().map(|w| w.amount).sum(),
    })
}
