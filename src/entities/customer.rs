//! Customer entity - One pigmy savings account.
//!
//! `balance` is the authoritative running total, held as an exact decimal.
//! It is only ever changed by the deposit and withdrawal operations in
//! `core`, and always by a write conditioned on the balance that was read,
//! so concurrent writers cannot lose each other's changes.

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Collection cadence agreed with the customer
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    #[sea_orm(string_value = "daily")]
    Daily,
    #[sea_orm(string_value = "weekly")]
    Weekly,
}

/// Lifecycle of the account
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "inactive")]
    Inactive,
    #[sea_orm(string_value = "closed")]
    Closed,
}

/// Customer database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "customers")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier for the customer
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Full name
    pub name: String,
    /// Login email
    #[sea_orm(unique)]
    pub email: String,
    /// Contact number
    pub phone: String,
    /// Postal address
    pub address: String,
    /// Opaque password hash produced upstream
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Globally unique account number (`PG` followed by ten digits)
    #[sea_orm(unique)]
    pub account_number: String,
    /// Daily or weekly collection
    pub account_type: AccountType,
    /// Plan the customer is enrolled in
    pub package_id: i64,
    /// Assigned collector; the single source of the assignment relation
    pub collector_id: Option<i64>,
    /// Running balance
    pub balance: Decimal,
    /// Date of the last regular deposit that reached the balance
    pub last_deposit_date: Option<DateTimeUtc>,
    /// When the plan started
    pub start_date: DateTimeUtc,
    /// `start_date` plus the plan duration
    pub maturity_date: DateTimeUtc,
    /// Closed accounts accept no further deposits or withdrawals
    pub is_closed: bool,
    /// Account lifecycle status
    pub status: AccountStatus,
    /// Stored path of the KYC documents, if uploaded
    pub kyc_docs: Option<String>,
    /// Stored path of the profile image, if uploaded
    pub profile_image: Option<String>,
    /// When the customer was created
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each customer is enrolled in one plan
    #[sea_orm(
        belongs_to = "super::plan::Entity",
        from = "Column::PackageId",
        to = "super::plan::Column::Id"
    )]
    Plan,
    /// Each customer is assigned to at most one collector
    #[sea_orm(
        belongs_to = "super::collector::Entity",
        from = "Column::CollectorId",
        to = "super::collector::Column::Id"
    )]
    Collector,
    /// One customer has many deposits
    #[sea_orm(has_many = "super::deposit::Entity")]
    Deposits,
    /// One customer has many withdrawal requests
    #[sea_orm(has_many = "super::withdrawal_request::Entity")]
    WithdrawalRequests,
}

impl Related<super::plan::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Plan.def()
    }
}

impl Related<super::collector::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Collector.def()
    }
}

impl Related<super::deposit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Deposits.def()
    }
}

impl Related<super::withdrawal_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WithdrawalRequests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
