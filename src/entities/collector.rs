//! Collector entity - A field agent who collects cash deposits.
//!
//! The customers a collector may act on are not stored here; they are
//! derived from `customers.collector_id` (see `core::assignment`).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Collector database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "collectors")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier for the collector
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Full name
    pub name: String,
    /// Login email
    #[sea_orm(unique)]
    pub email: String,
    /// Contact number
    pub phone: String,
    /// Area or route the collector covers
    pub area: Option<String>,
    /// Opaque password hash produced upstream
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Inactive collectors keep their history but take no new work
    pub is_active: bool,
    /// When the collector was created
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One collector is assigned many customers
    #[sea_orm(has_many = "super::customer::Entity")]
    Customers,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
