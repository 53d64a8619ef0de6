//! Customer self-service: deposits, withdrawal requests, feedback.

use super::{ActionResponse, CustomerAccount, LedgerContext};
use crate::{
    core::{
        customer, deposit,
        deposit::{DepositReceipt, RecordDeposit},
        feedback::{self, NewFeedback},
        schedule::{self, DepositDue},
        withdrawal::{self, NewWithdrawal},
    },
    entities::{
        FeedbackSource, PaymentMethod, deposit as deposit_entity, feedback as feedback_entity,
        withdrawal_request,
    },
    errors::Result,
};
use chrono::Utc;
use tracing::instrument;

async fn load_account(
    db: &sea_orm::DatabaseConnection,
    customer_id: i64,
) -> Result<CustomerAccount> {
    let customer = customer::require_customer(db, customer_id).await?;
    let withdrawal_requests =
        withdrawal::withdrawal_request_ids_for_customer(db, customer_id).await?;
    Ok(CustomerAccount {
        customer,
        withdrawal_requests,
    })
}

/// The customer's account, with withdrawal request ids attached.
#[instrument(skip(ctx))]
pub async fn account(ctx: &LedgerContext, customer_id: i64) -> ActionResponse<CustomerAccount> {
    let result = load_account(&ctx.database, customer_id).await;
    ActionResponse::from_result(result, |account| {
        format!("Account {}", account.customer.account_number)
    })
}

/// Whether a regular deposit is due right now.
#[instrument(skip(ctx))]
pub async fn deposit_due(ctx: &LedgerContext, customer_id: i64) -> ActionResponse<DepositDue> {
    let result = schedule::deposit_due_status(
        &ctx.database,
        customer_id,
        Utc::now(),
        ctx.settings.monthly_due_rule,
    )
    .await;
    ActionResponse::from_result(result, |due| {
        if due.is_due {
            format!("A deposit of {:.2} is due", due.amount)
        } else {
            format!("Next deposit is due on {}", due.next_due_date)
        }
    })
}

/// Records a regular or dues-clearance deposit.
#[instrument(skip(ctx, payload))]
pub async fn record_deposit(
    ctx: &LedgerContext,
    customer_id: i64,
    payload: RecordDeposit,
) -> ActionResponse<DepositReceipt> {
    let result = deposit::record_deposit(
        &ctx.database,
        customer_id,
        payload,
        Utc::now(),
        ctx.settings.monthly_due_rule,
    )
    .await;
    ActionResponse::from_result(result, |receipt| match receipt.deposit.payment_method {
        PaymentMethod::Online => format!(
            "Deposit of {:.2} received. New balance: {:.2}",
            receipt.deposit.amount,
            receipt.balance.unwrap_or_default()
        ),
        PaymentMethod::InHand => format!(
            "Deposit of {:.2} recorded and pending collector approval",
            receipt.deposit.amount
        ),
    })
}

pub async fn deposits(
    ctx: &LedgerContext,
    customer_id: i64,
) -> ActionResponse<Vec<deposit_entity::Model>> {
    let result = deposit::deposits_for_customer(&ctx.database, customer_id).await;
    ActionResponse::from_result(result, |list| format!("{} deposits", list.len()))
}

/// Files a withdrawal request.
#[instrument(skip(ctx, payload))]
pub async fn request_withdrawal(
    ctx: &LedgerContext,
    customer_id: i64,
    payload: NewWithdrawal,
) -> ActionResponse<withdrawal_request::Model> {
    let result = withdrawal::request_withdrawal(&ctx.database, customer_id, payload).await;
    ActionResponse::from_result(result, |request| {
        format!(
            "Withdrawal request of {:.2} submitted for approval",
            request.amount
        )
    })
}

pub async fn withdrawals(
    ctx: &LedgerContext,
    customer_id: i64,
) -> ActionResponse<Vec<withdrawal_request::Model>> {
    let result = withdrawal::withdrawals_for_customer(&ctx.database, customer_id).await;
    ActionResponse::from_result(result, |list| format!("{} withdrawal requests", list.len()))
}

#[instrument(skip(ctx, payload))]
pub async fn submit_feedback(
    ctx: &LedgerContext,
    customer_id: i64,
    payload: NewFeedback,
) -> ActionResponse<feedback_entity::Model> {
    let result =
        feedback::submit_feedback(&ctx.database, FeedbackSource::Customer, customer_id, payload)
            .await;
    ActionResponse::from_result(result, |_| "Thank you for your feedback".to_string())
}
