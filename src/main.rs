use dotenvy::dotenv;
use pigmy_ledger::{
    config::{self, database},
    core::{collector, plan},
    errors::Result,
    service::LedgerContext,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load config.toml (or defaults)
    let app_config = config::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;
    info!(
        "Ledger settings: monthly rule {:?}, admin reject gate {:?}",
        app_config.ledger.monthly_due_rule, app_config.ledger.admin_reject_gate
    );

    // 4. Connect and make sure the schema exists
    if std::env::var("DATABASE_URL").is_err() {
        std::fs::create_dir_all("data")?;
    }
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed plans listed in config.toml
    let seeded = plan::seed_plans(&db, &app_config.plans)
        .await
        .inspect_err(|e| error!("Failed to seed plans: {}", e))?;

    let ctx = LedgerContext::new(db, app_config.ledger);
    let plans = plan::list_active_plans(&ctx.database).await?;
    let collectors = collector::list_collectors(&ctx.database).await?;
    info!(
        "Ledger ready: {} active plans ({} newly seeded), {} collectors",
        plans.len(),
        seeded,
        collectors.len()
    );

    Ok(())
}
