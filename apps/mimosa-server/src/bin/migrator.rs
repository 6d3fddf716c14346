// [apps/mimosa-server/src/bin/migrator.rs]
//! Standalone schema migration: `StoreClient::connect` applies the
//! schema as part of connecting, so this binary exists only to give
//! an operator a way to run that step without also starting the
//! server (e.g. before a deploy, or in a CI smoke test).

use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    mimosa_telemetry::init_tracing("mimosa-migrator");

    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| "file:./data/mimosa.db".to_string());
    let database_token = std::env::var("TURSO_AUTH_TOKEN").ok();

    info!("applying schema to {}", database_url);
    match mimosa_store::StoreClient::connect(&database_url, database_token).await {
        Ok(_) => {
            info!("schema is up to date");
            Ok(())
        }
        Err(e) => {
            error!("migration failed: {}", e);
            std::process::exit(1);
        }
    }
}
