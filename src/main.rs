//! Entry point: load config, wire dependencies, and run the server.

use sessiond::config::Config;
use sessiond::db;
use sessiond::repositories::PgRepository;
use sessiond::services::{spawn_revocation_sweep, SessionService};
use sessiond::{create_app, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("config: {}", e))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db_pool = db::create_pool(
        &config.database_url,
        config.db_max_connections,
        config.store_timeout,
    )
    .await?;
    if config.run_migrations {
        db::run_migrations(&db_pool).await?;
        tracing::info!("migrations applied");
    }

    let repo = Arc::new(PgRepository::new(db_pool, config.store_timeout));
    let sessions = SessionService::from_config(repo.clone(), repo, &config.auth)?;

    if let Some(interval) = config.revocation_sweep_interval {
        spawn_revocation_sweep(sessions.revocations(), interval);
    }

    let app = create_app(AppState::new(sessions));

    tracing::info!(addr = %config.server_addr, "listening");
    let listener = tokio::net::TcpListener::bind(config.server_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
