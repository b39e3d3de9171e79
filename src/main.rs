use tracing::info;

use market_messaging::config::ServerConfig;
use market_messaging::stub::{self, StubStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (development convenience)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "market_messaging=debug,tower_http=debug".into()),
        )
        .init();

    let config = ServerConfig::from_env()?;

    // ── Seed data ─────────────────────────────────────────────────────────────
    let store = StubStore::demo();
    info!("Seeded demo conversations; authenticate with `Bearer 1`, `Bearer 2` or `Bearer 3`");

    // ── Listen ────────────────────────────────────────────────────────────────
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    stub::serve(listener, store).await?;
    Ok(())
}
