use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

mod apifootball;
mod config;
mod db;
mod engine;
mod server;

use apifootball::{ApiFootballClient, OddsSource};
use config::Config;
use db::Database;
use server::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    // Open database
    let db = Database::open(&config.database_path)?;
    info!("Database opened: {}", config.database_path);

    // Build the odds source when a key is present; the analysis endpoint
    // works without it, fixture lookups return 503.
    let odds_source: Option<Arc<dyn OddsSource>> = match &config.apisports_key {
        Some(key) => {
            let client = ApiFootballClient::new(&config.apisports_base, key)?;
            info!("Odds source configured: {}", client.name());
            Some(Arc::new(client))
        }
        None => {
            warn!("APISPORTS_KEY not set; fixture and odds lookups disabled");
            None
        }
    };

    let state = AppState {
        db,
        params: config.engine_params(),
        odds_source,
        apisports_base: config.apisports_base.clone(),
    };
    let app = server::router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
