use std::sync::Arc;

use forum::ForumClient;
use migration::{Migrator, MigratorTrait};

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "doscores={level},server={level},engine={level},forum={level}",
            level = settings.app.level
        ))
        .init();

    let db = parse_database(&settings.app.database).await?;
    let engine = engine::Engine::builder()
        .database(db)
        .fee_policy(settings.fees)
        .build()
        .await?;
    tracing::info!(fees = ?settings.fees, "ledger ready");

    let forum = ForumClient::new(&settings.forum)?;
    if settings.server.sync_key.is_empty() {
        tracing::warn!("server.sync_key is empty: logins are disabled");
    }

    server::run(engine, Arc::new(forum), settings.server).await?;
    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let database = sea_orm::Database::connect(config.url()).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
