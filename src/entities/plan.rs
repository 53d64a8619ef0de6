//! Plan entity - A pigmy savings plan customers subscribe to.
//!
//! Plans are reference data: the deposit amount and frequency drive the
//! deposit-due schedule, the duration drives a customer's maturity date.

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// How often a regular deposit falls due
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum DepositFrequency {
    /// Once per calendar day
    #[sea_orm(string_value = "daily")]
    Daily,
    /// Once per Sunday-anchored week
    #[sea_orm(string_value = "weekly")]
    Weekly,
    /// Once per month
    #[sea_orm(string_value = "monthly")]
    Monthly,
}

/// Plan database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "plans")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier for the plan
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "Daily 100")
    #[sea_orm(unique)]
    pub name: String,
    /// Schedule of regular deposits
    pub deposit_frequency: DepositFrequency,
    /// Amount of one regular deposit
    pub deposit_amount: Decimal,
    /// Length of the plan in months
    pub duration_months: i32,
    /// Annual interest rate in percent
    pub interest_rate: Decimal,
    /// Amount paid out at maturity
    pub maturity_amount: Decimal,
    /// Inactive plans are hidden from new sign-ups
    pub is_active: bool,
    /// When the plan was created
    pub created_at: DateTimeUtc,
    /// When the plan was last modified
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One plan has many customers
    #[sea_orm(has_many = "super::customer::Entity")]
    Customers,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
