//! Deposit entity - One attempted contribution to a customer's balance.
//!
//! `balance_updated` records whether `amount` has already been added to the
//! customer balance. Every credit sets it and every reversal clears it, so a
//! deposit can never be credited twice.

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// How the money reached the collector
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash handed to a collector; needs approval
    #[sea_orm(string_value = "in_hand")]
    InHand,
    /// Paid online; approved on creation
    #[sea_orm(string_value = "online")]
    Online,
}

impl PaymentMethod {
    /// Status a freshly recorded deposit starts in.
    #[must_use]
    pub const fn initial_status(self) -> DepositStatus {
        match self {
            Self::Online => DepositStatus::Approved,
            Self::InHand => DepositStatus::Pending,
        }
    }
}

/// Scheduled deposit or catch-up payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum DepositType {
    #[sea_orm(string_value = "regular")]
    Regular,
    #[sea_orm(string_value = "dues_clearance")]
    DuesClearance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum DepositStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

/// Deposit database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "deposits")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier for the deposit
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Customer whose balance this deposit feeds
    pub customer_id: i64,
    /// Plan the deposit was made under
    pub plan_id: i64,
    /// Collector assigned to the customer when the deposit was recorded
    pub collector_id: Option<i64>,
    /// Deposited amount
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    /// Payment reference; present exactly when `payment_method` is online
    pub reference_id: Option<String>,
    /// When the deposit was made
    pub deposit_date: DateTimeUtc,
    pub deposit_type: DepositType,
    pub status: DepositStatus,
    /// Collector who approved the deposit
    pub approved_by: Option<i64>,
    /// When it was approved
    pub approved_at: Option<DateTimeUtc>,
    /// Reason given on rejection
    pub rejected_reason: Option<String>,
    /// Whether `amount` is currently included in the customer balance
    pub balance_updated: bool,
    /// When the record was created
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each deposit belongs to one customer
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
