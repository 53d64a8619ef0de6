//! Database configuration module.
//!
//! Handles the `SQLite` connection and table creation using `SeaORM`. Tables
//! are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the
//! Rust structs.

use crate::entities::{Collector, Customer, Deposit, Feedback, Plan, WithdrawalRequest};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/pigmy_ledger.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable or
/// returns the default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    tracing::info!("Connecting to {}", database_url);
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates all ledger tables from the entity definitions.
///
/// Referenced tables are created before the tables that point at them.
/// Existing tables are left alone.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    for mut table in [
        schema.create_table_from_entity(Plan),
        schema.create_table_from_entity(Collector),
        schema.create_table_from_entity(Customer),
        schema.create_table_from_entity(Deposit),
        schema.create_table_from_entity(WithdrawalRequest),
        schema.create_table_from_entity(Feedback),
    ] {
        table.if_not_exists();
        db.execute(builder.build(&table)).await?;
    }

    Ok(())
}
