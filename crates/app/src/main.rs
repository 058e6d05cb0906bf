use std::{net::SocketAddr, time::Duration};

use migration::{Migrator, MigratorTrait};
use server::{Identity, IdentityVerifier};
use settings::{Database, IdentityMode};

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;
    let mut tasks = tokio::task::JoinSet::new();

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "suma={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let timezone = settings.app.timezone()?;
    let verifier = build_verifier(&settings.identity)?;
    if !verifier.is_configured() {
        tracing::warn!("identity provider not configured, protected routes will answer 503");
    }

    if let Some(server) = settings.server {
        tasks.spawn(async move {
            tracing::info!("Found server settings...");
            let db = match parse_database(&server.database).await {
                Ok(db) => db,
                Err(err) => {
                    tracing::error!("failed to initialize database: {err}");
                    return;
                }
            };

            let engine = match engine::Engine::builder()
                .database(db)
                .timezone(timezone)
                .build()
                .await
            {
                Ok(engine) => engine,
                Err(err) => {
                    tracing::error!("failed to build engine from database: {err}");
                    return;
                }
            };
            let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
            let addr: SocketAddr = match format!("{}:{}", bind, server.port).parse() {
                Ok(addr) => addr,
                Err(err) => {
                    tracing::error!("invalid server address {bind}:{}: {err}", server.port);
                    return;
                }
            };
            server::run(engine, verifier, addr).await;
        });
    } else {
        tracing::warn!("no [server] section found, nothing to run");
    }

    while tasks.join_next().await.is_some() {
        tasks.shutdown().await;
    }

    Ok(())
}

fn build_verifier(
    config: &settings::Identity,
) -> Result<IdentityVerifier, Box<dyn std::error::Error + Send + Sync>> {
    let verifier = match config.mode {
        IdentityMode::Remote => IdentityVerifier::remote(
            config.api_key.clone().unwrap_or_default(),
            config.lookup_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )?,
        IdentityMode::Static => IdentityVerifier::from_tokens(config.tokens.iter().map(|entry| {
            (
                entry.token.clone(),
                Identity {
                    uid: entry.uid.clone(),
                    email: entry.email.clone(),
                    display_name: entry.display_name.clone(),
                    ..Default::default()
                },
            )
        })),
        IdentityMode::Disabled => IdentityVerifier::Disabled,
    };
    Ok(verifier)
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
