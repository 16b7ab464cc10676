mod config;
mod error;
mod handlers;
mod models;
mod response;
mod routes;
mod server;
mod state;
mod store;
mod telemetry;

use anyhow::Context;
use tokio::net::TcpListener;

use crate::{config::Config, state::AppState, store::UserStore};

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    let providers = match telemetry::init_telemetry(&config) {
        Ok(providers) => providers,
        Err(err) => {
            eprintln!("Failed to initialise telemetry: {err:#}");
            std::process::exit(1);
        }
    };

    let result = run(config).await;

    if let Some(providers) = providers {
        providers.shutdown();
    }

    match result {
        Ok(()) => tracing::info!("All systems offline"),
        Err(err) => {
            tracing::error!(error = ?err, "Failed to start");
            std::process::exit(1);
        }
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    let state = AppState::new(UserStore::new());
    let app = routes::create_router(state, &config);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    tracing::info!(
        addr = %config.bind_addr,
        request_timeout = ?config.request_timeout,
        idle_timeout = ?config.idle_timeout,
        otlp = config.otlp_enabled,
        "Listening"
    );

    server::serve(listener, app, config, shutdown_signal()).await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to install CTRL+C signal handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, flushing telemetry...");
}
