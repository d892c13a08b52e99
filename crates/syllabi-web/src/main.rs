mod error;
mod routes;

use std::sync::Arc;

use anyhow::{Context, Result};
use syllabi_core::config::SyllabiConfig;
use syllabi_core::generation::{create_generator, Generator, OfflineGenerator};
use syllabi_core::storage;
use syllabi_core::Workbench;

pub struct AppState {
    pub workbench: Workbench<Generator>,
    pub config: SyllabiConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "syllabi_web=info".parse().unwrap()),
        )
        .init();

    let config = SyllabiConfig::load(std::env::current_dir().ok().as_deref()).unwrap_or_else(|e| {
        tracing::warn!("failed to load config, using defaults: {e}");
        SyllabiConfig::default_config()
    });

    let backend = storage::create_backend(&config).context("failed to open storage")?;
    tracing::info!("storage: {}", backend.describe());

    let generator = create_generator(&config.llm).unwrap_or_else(|e| {
        tracing::warn!("{e}; falling back to the offline generator");
        Generator::Offline(OfflineGenerator)
    });

    let workbench = Workbench::new(backend, generator, config.history.max_entries);
    if let Some(session) = workbench.restore().await? {
        tracing::info!("resumed session for {}", session.email());
    }

    let state = Arc::new(AppState {
        workbench,
        config: config.clone(),
    });

    let app = routes::app(state);

    let addr = format!("{}:{}", config.web.host, config.web.port);
    tracing::info!("syllabi-web listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
