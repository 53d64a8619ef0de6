//! Administrator operations.
//!
//! Admin actions on deposits and withdrawals skip the assignment check.
//! Which deposits an admin may reject is decided by
//! [`LedgerSettings::admin_reject_gate`](crate::config::LedgerSettings).

use super::{
    ActionResponse, DepositView, LedgerContext, RejectPayload, WithdrawalView, deposit_view,
    withdrawal_view,
};
use crate::{
    core::{
        assignment,
        collector::{self, NewCollector},
        customer::{self, NewCustomer},
        deposit,
        feedback::{self, FeedbackFilter},
        plan::{self, NewPlan},
        report::{self, BalanceReconciliation},
        withdrawal,
    },
    entities::{
        FeedbackStatus, collector as collector_entity, customer as customer_entity,
        feedback as feedback_entity, plan as plan_entity,
    },
};
use serde::Deserialize;
use tracing::instrument;

/// Review decision on a feedback record.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackReview {
    pub status: FeedbackStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

#[instrument(skip(ctx, input))]
pub async fn create_plan(
    ctx: &LedgerContext,
    input: NewPlan,
) -> ActionResponse<plan_entity::Model> {
    let result = plan::create_plan(&ctx.database, input).await;
    ActionResponse::from_result(result, |plan| format!("Plan '{}' created", plan.name))
}

#[instrument(skip(ctx))]
pub async fn deactivate_plan(
    ctx: &LedgerContext,
    plan_id: i64,
) -> ActionResponse<plan_entity::Model> {
    let result = plan::deactivate_plan(&ctx.database, plan_id).await;
    ActionResponse::from_result(result, |plan| format!("Plan '{}' deactivated", plan.name))
}

#[instrument(skip(ctx, input))]
pub async fn create_collector(
    ctx: &LedgerContext,
    input: NewCollector,
) -> ActionResponse<collector_entity::Model> {
    let result = collector::create_collector(&ctx.database, input).await;
    ActionResponse::from_result(result, |c| format!("Collector {} created", c.name))
}

#[instrument(skip(ctx, input))]
pub async fn create_customer(
    ctx: &LedgerContext,
    input: NewCustomer,
) -> ActionResponse<customer_entity::Model> {
    let result = customer::create_customer(&ctx.database, input).await;
    ActionResponse::from_result(result, |c| {
        format!("Customer account {} opened", c.account_number)
    })
}

#[instrument(skip(ctx))]
pub async fn close_account(
    ctx: &LedgerContext,
    customer_id: i64,
) -> ActionResponse<customer_entity::Model> {
    let result = customer::close_account(&ctx.database, customer_id).await;
    ActionResponse::from_result(result, |c| format!("Account {} closed", c.account_number))
}

/// Moves a customer to `collector_id`.
#[instrument(skip(ctx))]
pub async fn assign_customer(
    ctx: &LedgerContext,
    customer_id: i64,
    collector_id: i64,
) -> ActionResponse<customer_entity::Model> {
    let result = assignment::assign_customer(&ctx.database, customer_id, collector_id).await;
    ActionResponse::from_result(result, |_| {
        format!("Customer {customer_id} assigned to collector {collector_id}")
    })
}

#[instrument(skip(ctx))]
pub async fn unassign_customer(
    ctx: &LedgerContext,
    customer_id: i64,
) -> ActionResponse<customer_entity::Model> {
    let result = assignment::unassign_customer(&ctx.database, customer_id).await;
    ActionResponse::from_result(result, |_| format!("Customer {customer_id} unassigned"))
}

#[instrument(skip(ctx, payload))]
pub async fn reject_deposit(
    ctx: &LedgerContext,
    admin_id: i64,
    deposit_id: i64,
    payload: RejectPayload,
) -> ActionResponse<DepositView> {
    let rejected = deposit::reject_deposit_admin(
        &ctx.database,
        admin_id,
        deposit_id,
        payload.reason,
        ctx.settings.admin_reject_gate,
    )
    .await;
    let result = deposit_view(&ctx.database, rejected).await;
    ActionResponse::from_result(result, |_| "Deposit rejected by admin".to_string())
}

#[instrument(skip(ctx, payload))]
pub async fn reject_withdrawal(
    ctx: &LedgerContext,
    admin_id: i64,
    request_id: i64,
    payload: RejectPayload,
) -> ActionResponse<WithdrawalView> {
    let rejected =
        withdrawal::reject_withdrawal_admin(&ctx.database, admin_id, request_id, payload.reason)
            .await;
    let result = withdrawal_view(&ctx.database, rejected).await;
    ActionResponse::from_result(result, |_| {
        "Withdrawal request rejected by admin".to_string()
    })
}

/// Stored balance against the balance implied by the customer's records.
pub async fn reconcile_balance(
    ctx: &LedgerContext,
    customer_id: i64,
) -> ActionResponse<BalanceReconciliation> {
    let result = report::reconcile_customer_balance(&ctx.database, customer_id).await;
    ActionResponse::from_result(result, |r| {
        if r.is_consistent() {
            "Balance matches the ledger".to_string()
        } else {
            format!("Balance drifts from the ledger by {}", r.drift)
        }
    })
}

pub async fn list_feedback(
    ctx: &LedgerContext,
    filter: FeedbackFilter,
) -> ActionResponse<Vec<feedback_entity::Model>> {
    let result = feedback::list_feedback(&ctx.database, filter).await;
    ActionResponse::from_result(result, |list| format!("{} feedback records", list.len()))
}

#[instrument(skip(ctx, review))]
pub async fn review_feedback(
    ctx: &LedgerContext,
    feedback_id: i64,
    review: FeedbackReview,
) -> ActionResponse<feedback_entity::Model> {
    let result =
        feedback::update_feedback_status(&ctx.database, feedback_id, review.status, review.notes)
            .await;
    ActionResponse::from_result(result, |_| "Feedback updated".to_string())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        config::{AdminRejectGate, LedgerSettings},
        core::withdrawal::NewWithdrawal,
        entities::{DepositFrequency, DepositStatus, HandlerRole, WithdrawalStatus},
        errors::{ErrorKind, Result},
        test_utils::*,
    };

    const ADMIN: i64 = 1;

    fn settings(gate: AdminRejectGate) -> LedgerSettings {
        LedgerSettings {
            admin_reject_gate: gate,
            ..LedgerSettings::default()
        }
    }

    #[tokio::test]
    async fn test_literal_gate_refuses_online_deposit() -> Result<()> {
        let (db, _plan, _collector, customer) =
            setup_with_customer(DepositFrequency::Daily, dec!(100)).await?;
        let online_deposit = record_at(&db, customer.id, online("UPI-1"), at(2026, 10, 17, 9))
            .await?
            .deposit;
        let cash = record_at(&db, customer.id, in_hand(), at(2026, 10, 18, 9))
            .await?
            .deposit;
        let ctx = LedgerContext::new(db, settings(AdminRejectGate::Literal));

        let refused =
            reject_deposit(&ctx, ADMIN, online_deposit.id, RejectPayload::default()).await;
        assert!(!refused.success);
        assert_eq!(refused.error, Some(ErrorKind::StateConflict));

        let rejected = reject_deposit(&ctx, ADMIN, cash.id, RejectPayload::default()).await;
        assert!(rejected.success);
        let view = rejected.data.unwrap();
        assert_eq!(view.deposit.status, DepositStatus::Rejected);
        assert_eq!(view.customer.balance, dec!(100));
        Ok(())
    }

    #[tokio::test]
    async fn test_corrected_gate_reverses_credit_once() -> Result<()> {
        let (db, _plan, _collector, customer) =
            setup_with_customer(DepositFrequency::Daily, dec!(100)).await?;
        let deposit = record_at(&db, customer.id, online("UPI-1"), at(2026, 10, 18, 9))
            .await?
            .deposit;
        let ctx = LedgerContext::new(db, settings(AdminRejectGate::Corrected));

        let payload = RejectPayload {
            reason: Some("Payment bounced".to_string()),
        };
        let response = reject_deposit(&ctx, ADMIN, deposit.id, payload).await;
        assert!(response.success);
        let view = response.data.unwrap();
        assert_eq!(view.customer.balance, dec!(0));
        assert!(!view.deposit.balance_updated);
        assert_eq!(view.deposit.rejected_reason.as_deref(), Some("Payment bounced"));

        let again = reject_deposit(&ctx, ADMIN, deposit.id, RejectPayload::default()).await;
        assert_eq!(again.error, Some(ErrorKind::StateConflict));

        let report = reconcile_balance(&ctx, customer.id).await.data.unwrap();
        assert!(report.is_consistent());
        Ok(())
    }

    #[tokio::test]
    async fn test_admin_rejects_any_pending_withdrawal() -> Result<()> {
        let (db, _plan, _collector, customer) =
            setup_with_customer(DepositFrequency::Daily, dec!(100)).await?;
        fund_customer(&db, customer.id, dec!(100)).await?;
        let request = withdrawal::request_withdrawal(
            &db,
            customer.id,
            NewWithdrawal {
                amount: dec!(40),
                requirements: String::new(),
            },
        )
        .await?;
        let ctx = LedgerContext::new(db, LedgerSettings::default());

        let response = reject_withdrawal(&ctx, ADMIN, request.id, RejectPayload::default()).await;
        assert!(response.success);
        let view = response.data.unwrap();
        assert_eq!(view.request.status, WithdrawalStatus::Rejected);
        assert_eq!(view.request.handled_by, Some(ADMIN));
        assert_eq!(view.request.handled_by_role, Some(HandlerRole::Admin));
        assert_eq!(view.customer.balance, dec!(100));
        Ok(())
    }

    #[tokio::test]
    async fn test_reassignment_moves_collector_rights() -> Result<()> {
        let (db, _plan, ravi, customer) =
            setup_with_customer(DepositFrequency::Daily, dec!(100)).await?;
        let meena = create_test_collector(&db, "Meena").await?;
        let ctx = LedgerContext::new(db, LedgerSettings::default());

        let response = assign_customer(&ctx, customer.id, meena.id).await;
        assert!(response.success);
        assert_eq!(response.data.unwrap().collector_id, Some(meena.id));
        assert!(!assignment::is_assigned(&ctx.database, ravi.id, customer.id).await?);
        assert!(assignment::is_assigned(&ctx.database, meena.id, customer.id).await?);

        let closed = close_account(&ctx, customer.id).await;
        assert!(closed.data.unwrap().is_closed);
        Ok(())
    }

    #[tokio::test]
    async fn test_review_feedback() -> Result<()> {
        let (db, _plan, _collector, customer) =
            setup_with_customer(DepositFrequency::Daily, dec!(100)).await?;
        let ctx = LedgerContext::new(db, LedgerSettings::default());

        let input = serde_json::from_str(
            r#"{"type": "service", "subject": "Late visit",
                "content": "Collector came late", "rating": 3}"#,
        )
        .unwrap();
        let record = crate::service::customer::submit_feedback(&ctx, customer.id, input)
            .await
            .data
            .unwrap();

        let review: FeedbackReview =
            serde_json::from_str(r#"{"status": "resolved", "notes": "Spoke to collector"}"#)
                .unwrap();
        let updated = review_feedback(&ctx, record.id, review).await.data.unwrap();
        assert_eq!(updated.status, FeedbackStatus::Resolved);

        let open = list_feedback(
            &ctx,
            FeedbackFilter {
                status: Some(FeedbackStatus::New),
                ..FeedbackFilter::default()
            },
        )
        .await;
        assert!(open.data.unwrap().is_empty());
        Ok(())
    }
}
