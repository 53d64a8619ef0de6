//! Feedback entity - Append-only notes from customers and collectors.
//!
//! The author is a tagged reference: `source` says which table `source_id`
//! points into. Use `core::feedback::resolve_feedback_source` to load it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum FeedbackSource {
    #[sea_orm(string_value = "customer")]
    Customer,
    #[sea_orm(string_value = "collector")]
    Collector,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum FeedbackStatus {
    #[sea_orm(string_value = "new")]
    New,
    #[sea_orm(string_value = "in_review")]
    InReview,
    #[sea_orm(string_value = "resolved")]
    Resolved,
}

/// Feedback database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "feedback")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub source: FeedbackSource,
    pub source_id: i64,
    /// Free-form category such as "complaint" or "suggestion"
    #[serde(rename = "type")]
    pub feedback_type: String,
    pub subject: String,
    pub content: String,
    /// 1 to 5 when given
    pub rating: Option<i32>,
    pub status: FeedbackStatus,
    /// Admin notes
    pub notes: Option<String>,
    pub created_at: DateTimeUtc,
}

/// Feedback has no foreign keys; the author reference is polymorphic
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
