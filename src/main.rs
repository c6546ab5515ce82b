//! textsmith - text improvement service

use textsmith::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env must be loaded before clap reads the environment
    dotenvy::dotenv().ok();

    // Initialize logging (info for this crate by default, override with RUST_LOG)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "textsmith=info,tower_http=info".into()),
        )
        .init();

    cli::run().await
}
