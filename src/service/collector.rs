//! Collector operations.
//!
//! Every mutation here goes through the assignment check in the core, so a
//! collector can only act on records of customers assigned to them.

use super::{
    ActionResponse, DepositView, LedgerContext, RejectPayload, WithdrawalView, deposit_view,
    withdrawal_view,
};
use crate::{
    core::{
        assignment,
        deposit::{self, DepositDecision},
        feedback::{self, NewFeedback},
        report::{self, CollectorWorkload},
        withdrawal::{self, WithdrawalApproval},
    },
    entities::{
        DepositStatus, FeedbackSource, deposit as deposit_entity, feedback as feedback_entity,
        withdrawal_request,
    },
    errors::ErrorKind,
};
use tracing::instrument;

pub async fn assigned_customers(
    ctx: &LedgerContext,
    collector_id: i64,
) -> ActionResponse<Vec<i64>> {
    let result = assignment::assigned_customer_ids(&ctx.database, collector_id).await;
    ActionResponse::from_result(result, |ids| format!("{} assigned customers", ids.len()))
}

pub async fn workload(ctx: &LedgerContext, collector_id: i64) -> ActionResponse<CollectorWorkload> {
    let result = report::collector_workload(&ctx.database, collector_id).await;
    ActionResponse::from_result(result, |w| {
        format!(
            "{} deposits and {} withdrawals awaiting action",
            w.pending_deposits, w.pending_withdrawals
        )
    })
}

pub async fn pending_deposits(
    ctx: &LedgerContext,
    collector_id: i64,
) -> ActionResponse<Vec<deposit_entity::Model>> {
    let result = deposit::pending_deposits_for_collector(&ctx.database, collector_id).await;
    ActionResponse::from_result(result, |list| format!("{} pending deposits", list.len()))
}

#[instrument(skip(ctx))]
pub async fn approve_deposit(
    ctx: &LedgerContext,
    collector_id: i64,
    deposit_id: i64,
) -> ActionResponse<DepositView> {
    let approved = deposit::approve_deposit(&ctx.database, collector_id, deposit_id).await;
    let result = deposit_view(&ctx.database, approved).await;
    ActionResponse::from_result(result, |view| {
        format!("Deposit approved. New balance: {:.2}", view.customer.balance)
    })
}

#[instrument(skip(ctx, payload))]
pub async fn update_deposit_status(
    ctx: &LedgerContext,
    collector_id: i64,
    deposit_id: i64,
    payload: DepositDecision,
) -> ActionResponse<DepositView> {
    let updated =
        deposit::update_deposit_status(&ctx.database, collector_id, deposit_id, payload).await;
    let result = deposit_view(&ctx.database, updated).await;
    ActionResponse::from_result(result, |view| match view.deposit.status {
        DepositStatus::Approved => "Deposit approved".to_string(),
        _ => "Deposit rejected".to_string(),
    })
}

#[instrument(skip(ctx, payload))]
pub async fn reject_deposit(
    ctx: &LedgerContext,
    collector_id: i64,
    deposit_id: i64,
    payload: RejectPayload,
) -> ActionResponse<DepositView> {
    let rejected =
        deposit::reject_deposit(&ctx.database, collector_id, deposit_id, payload.reason).await;
    let result = deposit_view(&ctx.database, rejected).await;
    ActionResponse::from_result(result, |_| "Deposit rejected".to_string())
}

#[instrument(skip(ctx))]
pub async fn delete_deposit(
    ctx: &LedgerContext,
    collector_id: i64,
    deposit_id: i64,
) -> ActionResponse<DepositView> {
    let deleted = deposit::delete_deposit(&ctx.database, collector_id, deposit_id).await;
    let result = deposit_view(&ctx.database, deleted).await;
    ActionResponse::from_result(result, |_| "Deposit deleted".to_string())
}

pub async fn pending_withdrawals(
    ctx: &LedgerContext,
    collector_id: i64,
) -> ActionResponse<Vec<withdrawal_request::Model>> {
    let result = withdrawal::pending_withdrawals_for_collector(&ctx.database, collector_id).await;
    ActionResponse::from_result(result, |list| {
        format!("{} pending withdrawal requests", list.len())
    })
}

/// Approves a withdrawal, or reports the automatic rejection when the
/// balance no longer covers it.
#[instrument(skip(ctx))]
pub async fn approve_withdrawal(
    ctx: &LedgerContext,
    collector_id: i64,
    request_id: i64,
) -> ActionResponse<WithdrawalView> {
    let outcome =
        match withdrawal::approve_withdrawal(&ctx.database, collector_id, request_id).await {
            Ok(outcome) => outcome,
            Err(err) => return ActionResponse::from_error(&err),
        };

    let approved = outcome.is_approved();
    let request = match outcome {
        WithdrawalApproval::Approved { request, .. }
        | WithdrawalApproval::AutoRejected { request, .. } => request,
    };
    match withdrawal_view(&ctx.database, Ok(request)).await {
        Ok(view) if approved => ActionResponse::ok(
            format!(
                "Withdrawal approved. New balance: {:.2}",
                view.customer.balance
            ),
            view,
        ),
        Ok(view) => ActionResponse::refused(
            "Insufficient balance; the withdrawal request was rejected",
            view,
            ErrorKind::InsufficientBalance,
        ),
        Err(err) => ActionResponse::from_error(&err),
    }
}

#[instrument(skip(ctx, payload))]
pub async fn reject_withdrawal(
    ctx: &LedgerContext,
    collector_id: i64,
    request_id: i64,
    payload: RejectPayload,
) -> ActionResponse<WithdrawalView> {
    let rejected =
        withdrawal::reject_withdrawal(&ctx.database, collector_id, request_id, payload.reason)
            .await;
    let result = withdrawal_view(&ctx.database, rejected).await;
    ActionResponse::from_result(result, |_| "Withdrawal request rejected".to_string())
}

#[instrument(skip(ctx))]
pub async fn delete_withdrawal(
    ctx: &LedgerContext,
    collector_id: i64,
    request_id: i64,
) -> ActionResponse<withdrawal_request::Model> {
    let result = withdrawal::delete_withdrawal(&ctx.database, collector_id, request_id).await;
    ActionResponse::from_result(result, |_| "Withdrawal request deleted".to_string())
}

#[instrument(skip(ctx, payload))]
pub async fn submit_feedback(
    ctx: &LedgerContext,
    collector_id: i64,
    payload: NewFeedback,
) -> ActionResponse<feedback_entity::Model> {
    let result =
        feedback::submit_feedback(&ctx.database, FeedbackSource::Collector, collector_id, payload)
            .await;
    ActionResponse::from_result(result, |_| "Feedback submitted".to_string())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        config::LedgerSettings,
        core::withdrawal::NewWithdrawal,
        entities::{DepositFrequency, WithdrawalStatus},
        errors::Result,
        service::customer as customer_service,
        test_utils::*,
    };

    /// Online deposit, same-day refusal, withdrawal request, collector approval.
    #[tokio::test]
    async fn test_daily_customer_end_to_end() -> Result<()> {
        let (db, _plan, collector, customer) =
            setup_with_customer(DepositFrequency::Daily, dec!(100)).await?;
        let ctx = LedgerContext::new(db, LedgerSettings::default());

        let first = customer_service::record_deposit(&ctx, customer.id, online("UPI-1")).await;
        assert!(first.success);
        let receipt = first.data.unwrap();
        assert_eq!(receipt.balance, Some(dec!(100)));
        assert_eq!(receipt.deposit.status, DepositStatus::Approved);
        assert!(receipt.deposit.balance_updated);

        let second = customer_service::record_deposit(&ctx, customer.id, online("UPI-2")).await;
        assert!(!second.success);

        let request = customer_service::request_withdrawal(
            &ctx,
            customer.id,
            NewWithdrawal {
                amount: dec!(50),
                requirements: String::new(),
            },
        )
        .await
        .data
        .unwrap();
        assert_eq!(request.status, WithdrawalStatus::Pending);

        let approved = approve_withdrawal(&ctx, collector.id, request.id).await;
        assert!(approved.success);
        let view = approved.data.unwrap();
        assert_eq!(view.request.status, WithdrawalStatus::Approved);
        assert_eq!(view.customer.balance, dec!(50));
        Ok(())
    }

    #[tokio::test]
    async fn test_auto_rejected_withdrawal_is_not_success() -> Result<()> {
        let (db, _plan, collector, customer) =
            setup_with_customer(DepositFrequency::Daily, dec!(100)).await?;
        fund_customer(&db, customer.id, dec!(100)).await?;
        let ctx = LedgerContext::new(db, LedgerSettings::default());

        let big = NewWithdrawal {
            amount: dec!(90),
            requirements: String::new(),
        };
        let first = customer_service::request_withdrawal(&ctx, customer.id, big.clone())
            .await
            .data
            .unwrap();
        let second = customer_service::request_withdrawal(&ctx, customer.id, big)
            .await
            .data
            .unwrap();

        assert!(approve_withdrawal(&ctx, collector.id, first.id).await.success);
        let response = approve_withdrawal(&ctx, collector.id, second.id).await;
        assert!(!response.success);
        assert_eq!(response.error, Some(ErrorKind::InsufficientBalance));
        let view = response.data.unwrap();
        assert_eq!(view.request.status, WithdrawalStatus::Rejected);
        assert_eq!(view.customer.balance, dec!(10));
        Ok(())
    }

    #[tokio::test]
    async fn test_approve_deposit_reflects_balance() -> Result<()> {
        let (db, _plan, collector, customer) =
            setup_with_customer(DepositFrequency::Daily, dec!(100)).await?;
        let deposit = record_at(&db, customer.id, in_hand(), at(2026, 10, 18, 9))
            .await?
            .deposit;
        let ctx = LedgerContext::new(db, LedgerSettings::default());

        assert_eq!(pending_deposits(&ctx, collector.id).await.data.unwrap().len(), 1);
        let response = approve_deposit(&ctx, collector.id, deposit.id).await;
        assert!(response.success);
        assert_eq!(response.message, "Deposit approved. New balance: 100.00");
        assert_eq!(response.data.unwrap().customer.balance, dec!(100));

        let stranger = create_test_collector(&ctx.database, "Meena").await?;
        let response =
            reject_deposit(&ctx, stranger.id, deposit.id, RejectPayload::default()).await;
        assert_eq!(response.error, Some(ErrorKind::Authorization));
        Ok(())
    }
}
