use std::sync::Arc;

use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;
    let mut tasks = tokio::task::JoinSet::new();

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "jizhang={level},telegram_bot={level},server={level},engine={level},extraction={level}",
            level = settings.app.level
        ))
        .init();

    let db = parse_database(&settings.database).await?;
    let ledger = Arc::new(engine::Ledger::new(db));

    let provider = settings.extraction.and_then(|extraction| {
        extraction::ProviderConfig::select(
            extraction.dashscope_api_key,
            extraction.openai_api_key,
            extraction.openai_base_url,
        )
    });
    if provider.is_none() {
        tracing::info!("No extraction credential configured, text parsing uses the fallback only");
    }
    let extractor = Arc::new(extraction::Extractor::new(provider)?);

    if let Some(server) = settings.server {
        let ledger = ledger.clone();
        tasks.spawn(async move {
            tracing::info!("Found server settings...");
            let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
            let addr = format!("{}:{}", bind, server.port);
            let listener = match tokio::net::TcpListener::bind(addr).await {
                Ok(listener) => listener,
                Err(err) => {
                    tracing::error!("failed to bind server listener: {err}");
                    return;
                }
            };
            if let Err(err) = server::run_with_listener(ledger, listener).await {
                tracing::error!("server failed: {err}");
            }
        });
    }

    if let Some(telegram) = settings.telegram {
        let ledger = ledger.clone();
        let extractor = extractor.clone();
        tasks.spawn(async move {
            tracing::info!("Found telegram settings...");
            match telegram_bot::Bot::builder()
                .token(&telegram.token)
                .ledger(ledger)
                .extractor(extractor)
                .build()
            {
                Ok(bot) => bot.run().await,
                Err(err) => tracing::error!("failed to initialize telegram bot: {err}"),
            }
        });
    }

    while tasks.join_next().await.is_some() {
        tasks.shutdown().await;
    }

    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite { path } => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
