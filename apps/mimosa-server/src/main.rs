// [apps/mimosa-server/src/main.rs]
//! Entry point: load the environment, initialize tracing, ignite the
//! kernel, and run until shutdown.

use mimosa_server::config::AppConfig;
use mimosa_server::prelude::*;
use mimosa_telemetry::init_tracing;
use tracing::error;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing("mimosa-server");

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;

    runtime.block_on(async {
        let config = AppConfig::from_env();

        let kernel = match MimosaKernel::ignite(config).await {
            Ok(kernel) => kernel,
            Err(e) => {
                error!("failed to ignite kernel: {}", e);
                std::process::exit(1);
            }
        };

        if let Err(e) = kernel.run().await {
            error!("server exited with error: {}", e);
            std::process::exit(1);
        }

        Ok(())
    })
}
