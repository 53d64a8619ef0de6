//! Service layer - role-scoped entry points over the core ledger.
//!
//! Each role (customer, collector, admin) gets its own module. Every entry
//! point takes the authenticated actor id resolved upstream plus a typed
//! payload, and answers with an [`ActionResponse`] carrying a success flag,
//! a human-readable message and the affected records after all side effects.

/// Administrator operations
pub mod admin;
/// Collector operations, gated by the assignment directory
pub mod collector;
/// Customer self-service operations
pub mod customer;

use crate::{
    config::LedgerSettings,
    entities::{customer as customer_entity, deposit, withdrawal_request},
    errors::{Error, ErrorKind, Result},
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

/// Shared data available to every service call.
pub struct LedgerContext {
    /// Database connection for all ledger operations
    pub database: DatabaseConnection,
    /// Behaviour switches from `config.toml`
    pub settings: LedgerSettings,
}

impl LedgerContext {
    #[must_use]
    pub const fn new(database: DatabaseConnection, settings: LedgerSettings) -> Self {
        Self { database, settings }
    }
}

/// Uniform answer to every service call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
}

impl<T> ActionResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            error: None,
        }
    }

    /// A handled refusal that still reports the records it changed.
    pub fn refused(message: impl Into<String>, data: T, kind: ErrorKind) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: Some(data),
            error: Some(kind),
        }
    }

    #[must_use]
    pub fn from_error(err: &Error) -> Self {
        let kind = err.kind();
        if kind == ErrorKind::Infrastructure {
            tracing::error!("Ledger operation failed: {}", err);
        } else {
            tracing::debug!("Ledger operation refused: {}", err);
        }
        Self {
            success: false,
            message: err.to_string(),
            data: None,
            error: Some(kind),
        }
    }

    /// Builds a response from a core result, naming the success with `message`.
    pub fn from_result(result: Result<T>, message: impl FnOnce(&T) -> String) -> Self {
        match result {
            Ok(data) => {
                let text = message(&data);
                Self::ok(text, data)
            }
            Err(err) => Self::from_error(&err),
        }
    }
}

/// Optional free-text reason attached to a rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RejectPayload {
    #[serde(default, alias = "remarks")]
    pub reason: Option<String>,
}

/// A deposit together with its customer as they stand after the operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepositView {
    pub deposit: deposit::Model,
    pub customer: customer_entity::Model,
}

/// A withdrawal request together with its customer after the operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WithdrawalView {
    pub request: withdrawal_request::Model,
    pub customer: customer_entity::Model,
}

/// A customer with the ids of their withdrawal requests, as clients
/// expect the account to look.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerAccount {
    #[serde(flatten)]
    pub customer: customer_entity::Model,
    pub withdrawal_requests: Vec<i64>,
}

async fn deposit_view(
    db: &DatabaseConnection,
    deposit: Result<deposit::Model>,
) -> Result<DepositView> {
    let deposit = deposit?;
    let customer = crate::core::customer::require_customer(db, deposit.customer_id).await?;
    Ok(DepositView { deposit, customer })
}

async fn withdrawal_view(
    db: &DatabaseConnection,
    request: Result<withdrawal_request::Model>,
) -> Result<WithdrawalView> {
    let request = request?;
    let customer = crate::core::customer::require_customer(db, request.customer_id).await?;
    Ok(WithdrawalView { request, customer })
}
