//! Collector records.
//!
//! Collector CRUD never touches a balance; which customers a collector may
//! act on lives in `core::assignment`.

use crate::{
    entities::{Collector, collector},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};

/// Input for a new collector.
#[derive(Debug, Clone)]
pub struct NewCollector {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub area: Option<String>,
    /// Hash produced by the authentication layer
    pub password_hash: String,
}

/// Creates an active collector.
pub async fn create_collector(
    db: &DatabaseConnection,
    new_collector: NewCollector,
) -> Result<collector::Model> {
    if new_collector.name.trim().is_empty() {
        return Err(Error::validation("Collector name cannot be empty"));
    }
    if !new_collector.email.contains('@') {
        return Err(Error::validation("Collector email is not valid"));
    }

    let collector = collector::ActiveModel {
        name: Set(new_collector.name.trim().to_string()),
        email: Set(new_collector.email.trim().to_lowercase()),
        phone: Set(new_collector.phone),
        area: Set(new_collector.area),
        password_hash: Set(new_collector.password_hash),
        is_active: Set(true),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let result = collector.insert(db).await?;
    tracing::info!("Created collector {} ({})", result.id, result.name);
    Ok(result)
}

pub async fn get_collector_by_id<C>(db: &C, collector_id: i64) -> Result<Option<collector::Model>>
where
    C: ConnectionTrait,
{
    Collector::find_by_id(collector_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Like [`get_collector_by_id`] but a missing collector is an error.
pub async fn require_collector<C>(db: &C, collector_id: i64) -> Result<collector::Model>
where
    C: ConnectionTrait,
{
    get_collector_by_id(db, collector_id)
        .await?
        .ok_or_else(|| Error::not_found("Collector", collector_id))
}

pub async fn list_collectors(db: &DatabaseConnection) -> Result<Vec<collector::Model>> {
    Collector::find()
        .order_by_asc(collector::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}
