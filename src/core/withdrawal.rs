//! Withdrawal request lifecycle.
//!
//! A request is checked against the balance when it is made but reserves
//! nothing; the balance is checked again, and debited, only when a collector
//! approves it. Approval and rejection are terminal. The debit and the move
//! out of `pending` happen in one transaction, and the debit itself refuses
//! to take the balance below the amount, so a request is debited at most
//! once.

use crate::{
    core::{assignment, customer},
    entities::{HandlerRole, WithdrawalRequest, WithdrawalStatus, withdrawal_request},
    errors::{Error, Result},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};

/// Customer input for a withdrawal request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWithdrawal {
    pub amount: Decimal,
    #[serde(default)]
    pub requirements: String,
}

impl NewWithdrawal {
    pub fn validate(&self) -> Result<()> {
        if self.amount <= Decimal::ZERO {
            return Err(Error::validation(
                "Withdrawal amount must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Outcome of a collector approving a withdrawal request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WithdrawalApproval {
    /// The balance covered the request and was debited
    Approved {
        request: withdrawal_request::Model,
        balance: Decimal,
    },
    /// The balance no longer covered the request, so it was rejected instead
    AutoRejected {
        request: withdrawal_request::Model,
        balance: Decimal,
    },
}

impl WithdrawalApproval {
    #[must_use]
    pub const fn request(&self) -> &withdrawal_request::Model {
        match self {
            Self::Approved { request, .. } | Self::AutoRejected { request, .. } => request,
        }
    }

    #[must_use]
    pub const fn is_approved(&self) -> bool {
        matches!(self, Self::Approved { .. })
    }
}

pub async fn get_withdrawal_by_id<C>(
    db: &C,
    request_id: i64,
) -> Result<Option<withdrawal_request::Model>>
where
    C: ConnectionTrait,
{
    WithdrawalRequest::find_by_id(request_id)
        .one(db)
        .await
        .map_err(Into::into)
}

pub async fn require_withdrawal<C>(db: &C, request_id: i64) -> Result<withdrawal_request::Model>
where
    C: ConnectionTrait,
{
    get_withdrawal_by_id(db, request_id)
        .await?
        .ok_or_else(|| Error::not_found("Withdrawal request", request_id))
}

/// All withdrawal requests of a customer, newest first.
pub async fn withdrawals_for_customer(
    db: &DatabaseConnection,
    customer_id: i64,
) -> Result<Vec<withdrawal_request::Model>> {
    WithdrawalRequest::find()
        .filter(withdrawal_request::Column::CustomerId.eq(customer_id))
        .order_by_desc(withdrawal_request::Column::Date)
        .order_by_desc(withdrawal_request::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Ids of a customer's withdrawal requests in the order they were made.
///
/// This is the customer's `withdrawalRequests` list, derived from the
/// requests themselves rather than stored on the customer.
pub async fn withdrawal_request_ids_for_customer<C>(db: &C, customer_id: i64) -> Result<Vec<i64>>
where
    C: ConnectionTrait,
{
    WithdrawalRequest::find()
        .select_only()
        .column(withdrawal_request::Column::Id)
        .filter(withdrawal_request::Column::CustomerId.eq(customer_id))
        .order_by_asc(withdrawal_request::Column::Id)
        .into_tuple::<i64>()
        .all(db)
        .await
        .map_err(Into::into)
}

/// Pending requests of every customer assigned to the collector, oldest first.
pub async fn pending_withdrawals_for_collector(
    db: &DatabaseConnection,
    collector_id: i64,
) -> Result<Vec<withdrawal_request::Model>> {
    let customer_ids = assignment::assigned_customer_ids(db, collector_id).await?;
    WithdrawalRequest::find()
        .filter(withdrawal_request::Column::CustomerId.is_in(customer_ids))
        .filter(withdrawal_request::Column::Status.eq(WithdrawalStatus::Pending))
        .order_by_asc(withdrawal_request::Column::Date)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Moves a pending request to `changes`, failing if it is no longer pending.
async fn settle<C>(
    db: &C,
    request_id: i64,
    action: &'static str,
    changes: withdrawal_request::ActiveModel,
) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = WithdrawalRequest::update_many()
        .set(changes)
        .filter(withdrawal_request::Column::Id.eq(request_id))
        .filter(withdrawal_request::Column::Status.eq(WithdrawalStatus::Pending))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(not_pending(request_id, action));
    }
    Ok(())
}

fn not_pending(request_id: i64, action: &'static str) -> Error {
    Error::StateConflict {
        entity: "Withdrawal request",
        id: request_id,
        action,
        reason: "it is not pending".to_string(),
    }
}

/// Files a withdrawal request for the customer.
///
/// The amount must be covered by the balance right now. The request starts
/// pending, already pointing at the customer's assigned collector.
pub async fn request_withdrawal(
    db: &DatabaseConnection,
    customer_id: i64,
    input: NewWithdrawal,
) -> Result<withdrawal_request::Model> {
    input.validate()?;

    let txn = db.begin().await?;

    let customer = customer::require_customer(&txn, customer_id).await?;
    customer::ensure_open(&customer)?;
    if input.amount > customer.balance {
        return Err(Error::InsufficientBalance {
            balance: customer.balance,
            requested: input.amount,
        });
    }

    let handler = assignment::collector_for_customer(&txn, customer_id).await?;
    let now = Utc::now();
    let request = withdrawal_request::ActiveModel {
        customer_id: Set(customer_id),
        amount: Set(input.amount),
        date: Set(now),
        status: Set(WithdrawalStatus::Pending),
        handled_by: Set(handler.as_ref().map(|c| c.id)),
        handled_by_role: Set(handler.as_ref().map(|_| HandlerRole::Collector)),
        remarks: Set(None),
        requirements: Set(input.requirements.trim().to_string()),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    tracing::info!(
        "Customer {} requested withdrawal {} of {}",
        customer_id,
        request.id,
        request.amount
    );
    Ok(request)
}

/// Collector approval of a pending request.
///
/// The balance is checked again. If it still covers the amount it is debited
/// and the request approved; otherwise the request is rejected with a remark
/// and [`WithdrawalApproval::AutoRejected`] is returned. Both outcomes are
/// committed.
pub async fn approve_withdrawal(
    db: &DatabaseConnection,
    collector_id: i64,
    request_id: i64,
) -> Result<WithdrawalApproval> {
    const ACTION: &str = "approve";
    let txn = db.begin().await?;

    let request = require_withdrawal(&txn, request_id).await?;
    assignment::ensure_assigned(&txn, collector_id, request.customer_id).await?;
    if request.status != WithdrawalStatus::Pending {
        return Err(not_pending(request_id, ACTION));
    }

    let debited = customer::debit_if_covered(&txn, request.customer_id, request.amount).await?;
    let balance = customer::require_customer(&txn, request.customer_id)
        .await?
        .balance;

    let changes = if debited {
        withdrawal_request::ActiveModel {
            status: Set(WithdrawalStatus::Approved),
            handled_by: Set(Some(collector_id)),
            handled_by_role: Set(Some(HandlerRole::Collector)),
            ..Default::default()
        }
    } else {
        tracing::warn!(
            "Withdrawal {} auto-rejected: balance {} below requested {}",
            request_id,
            balance,
            request.amount
        );
        withdrawal_request::ActiveModel {
            status: Set(WithdrawalStatus::Rejected),
            handled_by: Set(Some(collector_id)),
            handled_by_role: Set(Some(HandlerRole::Collector)),
            remarks: Set(Some(format!(
                "Insufficient balance at approval: available {balance}, requested {}",
                request.amount
            ))),
            ..Default::default()
        }
    };
    settle(&txn, request_id, ACTION, changes).await?;

    let request = require_withdrawal(&txn, request_id).await?;
    txn.commit().await?;

    if debited {
        tracing::info!("Collector {} approved withdrawal {}", collector_id, request_id);
        Ok(WithdrawalApproval::Approved { request, balance })
    } else {
        Ok(WithdrawalApproval::AutoRejected { request, balance })
    }
}

/// Collector rejection of a pending request. The balance is untouched.
pub async fn reject_withdrawal(
    db: &DatabaseConnection,
    collector_id: i64,
    request_id: i64,
    remarks: Option<String>,
) -> Result<withdrawal_request::Model> {
    const ACTION: &str = "reject";
    let txn = db.begin().await?;

    let request = require_withdrawal(&txn, request_id).await?;
    assignment::ensure_assigned(&txn, collector_id, request.customer_id).await?;

    settle(
        &txn,
        request_id,
        ACTION,
        withdrawal_request::ActiveModel {
            status: Set(WithdrawalStatus::Rejected),
            handled_by: Set(Some(collector_id)),
            handled_by_role: Set(Some(HandlerRole::Collector)),
            remarks: Set(remarks),
            ..Default::default()
        },
    )
    .await?;

    let request = require_withdrawal(&txn, request_id).await?;
    txn.commit().await?;

    tracing::info!("Collector {} rejected withdrawal {}", collector_id, request_id);
    Ok(request)
}

/// Administrator rejection of a pending request. No assignment check applies.
pub async fn reject_withdrawal_admin(
    db: &DatabaseConnection,
    admin_id: i64,
    request_id: i64,
    remarks: Option<String>,
) -> Result<withdrawal_request::Model> {
    let txn = db.begin().await?;

    require_withdrawal(&txn, request_id).await?;
    settle(
        &txn,
        request_id,
        "reject",
        withdrawal_request::ActiveModel {
            status: Set(WithdrawalStatus::Rejected),
            handled_by: Set(Some(admin_id)),
            handled_by_role: Set(Some(HandlerRole::Admin)),
            remarks: Set(remarks),
            ..Default::default()
        },
    )
    .await?;

    let request = require_withdrawal(&txn, request_id).await?;
    txn.commit().await?;

    tracing::info!("Admin {} rejected withdrawal {}", admin_id, request_id);
    Ok(request)
}

/// Collector deletion of a pending or rejected request.
///
/// Approved requests cannot be deleted: their debit has landed.
pub async fn delete_withdrawal(
    db: &DatabaseConnection,
    collector_id: i64,
    request_id: i64,
) -> Result<withdrawal_request::Model> {
    let txn = db.begin().await?;

    let request = require_withdrawal(&txn, request_id).await?;
    assignment::ensure_assigned(&txn, collector_id, request.customer_id).await?;

    let result = WithdrawalRequest::delete_many()
        .filter(withdrawal_request::Column::Id.eq(request_id))
        .filter(withdrawal_request::Column::Status.ne(WithdrawalStatus::Approved))
        .exec(&txn)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::StateConflict {
            entity: "Withdrawal request",
            id: request_id,
            action: "delete",
            reason: "it is approved".to_string(),
        });
    }

    txn.commit().await?;

    tracing::info!("Collector {} deleted withdrawal {}", collector_id, request_id);
    Ok(request)
}
