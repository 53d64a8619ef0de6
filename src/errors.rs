//! Unified error type for the ledger.
//!
//! Every failure a ledger operation can surface maps onto one [`ErrorKind`],
//! which the service layer uses to build its response.

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// Broad failure category reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing or malformed input, rejected before any mutation
    Validation,
    /// A referenced record does not exist
    NotFound,
    /// The acting collector may not touch the target record
    Authorization,
    /// The record is not in the state the action requires
    StateConflict,
    /// The withdrawal exceeds the current balance
    InsufficientBalance,
    /// Storage, configuration or environment failure
    Infrastructure,
}

/// Every failure a ledger operation can return.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Collector {collector_id} is not assigned to customer {customer_id}")]
    Unauthorized { collector_id: i64, customer_id: i64 },

    #[error("Cannot {action} {entity} {id}: {reason}")]
    StateConflict {
        entity: &'static str,
        id: i64,
        action: &'static str,
        reason: String,
    },

    #[error("Insufficient balance: available {balance}, requested {requested}")]
    InsufficientBalance { balance: Decimal, requested: Decimal },

    #[error("No deposit is due for customer {customer_id} until {next_due}")]
    DepositNotDue {
        customer_id: i64,
        next_due: chrono::NaiveDate,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

impl Error {
    /// Shorthand for a validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for a missing record.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Unauthorized { .. } => ErrorKind::Authorization,
            Self::StateConflict { .. } | Self::DepositNotDue { .. } => ErrorKind::StateConflict,
            Self::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            Self::Config { .. } | Self::Database(_) | Self::Io(_) | Self::EnvVar(_) => {
                ErrorKind::Infrastructure
            }
        }
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
