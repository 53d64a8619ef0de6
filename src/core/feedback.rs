//! Feedback records from customers and collectors.
//!
//! Feedback is append-only apart from its review status and admin notes,
//! and never touches a balance.

use crate::{
    core::{collector, customer},
    entities::{
        Feedback, FeedbackSource, FeedbackStatus, collector as collector_entity,
        customer as customer_entity, feedback,
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;

/// Input for a new feedback record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFeedback {
    #[serde(rename = "type")]
    pub feedback_type: String,
    pub subject: String,
    pub content: String,
    #[serde(default)]
    pub rating: Option<i32>,
}

impl NewFeedback {
    pub fn validate(&self) -> Result<()> {
        if self.subject.trim().is_empty() || self.content.trim().is_empty() {
            return Err(Error::validation("Subject and content are required"));
        }
        if self.rating.is_some_and(|r| !(1..=5).contains(&r)) {
            return Err(Error::validation("Rating must be between 1 and 5"));
        }
        Ok(())
    }
}

/// The record a feedback `source`/`source_id` pair points at.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedbackAuthor {
    Customer(customer_entity::Model),
    Collector(collector_entity::Model),
}

/// Filter for [`list_feedback`]; `None` fields match everything.
#[derive(Debug, Clone, Default)]
pub struct FeedbackFilter {
    pub source: Option<FeedbackSource>,
    pub status: Option<FeedbackStatus>,
}

/// Stores feedback from a customer or collector, who must exist.
pub async fn submit_feedback(
    db: &DatabaseConnection,
    source: FeedbackSource,
    source_id: i64,
    input: NewFeedback,
) -> Result<feedback::Model> {
    input.validate()?;
    // Resolving the author doubles as the existence check
    resolve(db, source, source_id).await?;

    let result = feedback::ActiveModel {
        source: Set(source),
        source_id: Set(source_id),
        feedback_type: Set(input.feedback_type.trim().to_string()),
        subject: Set(input.subject.trim().to_string()),
        content: Set(input.content.trim().to_string()),
        rating: Set(input.rating),
        status: Set(FeedbackStatus::New),
        notes: Set(None),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!("Feedback {} from {:?} {}", result.id, source, source_id);
    Ok(result)
}

pub async fn list_feedback(
    db: &DatabaseConnection,
    filter: FeedbackFilter,
) -> Result<Vec<feedback::Model>> {
    let mut query = Feedback::find();
    if let Some(source) = filter.source {
        query = query.filter(feedback::Column::Source.eq(source));
    }
    if let Some(status) = filter.status {
        query = query.filter(feedback::Column::Status.eq(status));
    }
    query
        .order_by_desc(feedback::Column::CreatedAt)
        .order_by_desc(feedback::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Admin review of a feedback record.
pub async fn update_feedback_status(
    db: &DatabaseConnection,
    feedback_id: i64,
    status: FeedbackStatus,
    notes: Option<String>,
) -> Result<feedback::Model> {
    let record = Feedback::find_by_id(feedback_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Feedback", feedback_id))?;

    let mut active: feedback::ActiveModel = record.into();
    active.status = Set(status);
    if notes.is_some() {
        active.notes = Set(notes);
    }
    Ok(active.update(db).await?)
}

async fn resolve(
    db: &DatabaseConnection,
    source: FeedbackSource,
    source_id: i64,
) -> Result<FeedbackAuthor> {
    match source {
        FeedbackSource::Customer => customer::require_customer(db, source_id)
            .await
            .map(FeedbackAuthor::Customer),
        FeedbackSource::Collector => collector::require_collector(db, source_id)
            .await
            .map(FeedbackAuthor::Collector),
    }
}

/// Loads the author of a feedback record.
pub async fn resolve_feedback_source(
    db: &DatabaseConnection,
    record: &feedback::Model,
) -> Result<FeedbackAuthor> {
    resolve(db, record.source, record.source_id).await
}
