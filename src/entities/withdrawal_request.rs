//! Withdrawal request entity - One attempted debit from a customer's balance.
//!
//! There is no `balance_updated` latch here: the debit happens in the same
//! statement sequence that moves the request out of `pending`, and nothing
//! ever moves it back.

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

/// Who `handled_by` points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum HandlerRole {
    #[sea_orm(string_value = "collector")]
    Collector,
    #[sea_orm(string_value = "admin")]
    Admin,
}

/// Withdrawal request database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "withdrawal_requests")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub customer_id: i64,
    /// Requested amount
    pub amount: Decimal,
    /// When the request was made
    pub date: DateTimeUtc,
    pub status: WithdrawalStatus,
    /// Collector or admin id, tagged by `handled_by_role`
    pub handled_by: Option<i64>,
    pub handled_by_role: Option<HandlerRole>,
    /// Note from whoever handled the request
    pub remarks: Option<String>,
    /// Free-text note from the customer
    pub requirements: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each request belongs to one customer
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
