use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trigger_proxy::config::Config;
use trigger_proxy::debounce::DebounceRegistry;
use trigger_proxy::dispatch::JenkinsDispatcher;
use trigger_proxy::mapping::MappingTable;
use trigger_proxy::server::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trigger_proxy=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();

    info!("Starting trigger-proxy");

    if config.jenkins_user.is_none() {
        info!("No Jenkins user configured, using anonymous trigger token mode");
    }
    if let Some(folder) = &config.jenkins_multi {
        info!(folder = %folder, "Found multibranch project");
    }

    let project_url = config.project_url();
    info!(
        project_url = %project_url,
        quiet_period_secs = config.quiet_period,
        mapping_file = %config.mapping_file.display(),
        file_matching = config.file_match,
        "Resolved configuration"
    );

    let mapping = MappingTable::load_file(&config.mapping_file, config.file_match)
        .context("failed to load mapping file")?;

    let dispatcher = JenkinsDispatcher::new(
        project_url,
        config.jenkins_user.clone(),
        config.jenkins_token.clone(),
        config.tls_verify,
    )
    .context("failed to construct trigger client")?;

    let registry = DebounceRegistry::new(config.quiet_period_duration(), Arc::new(dispatcher));
    let app = build_router(AppState::new(mapping, registry.clone(), config.file_match));

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!(addr = %config.listen_addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    // Pending timers never fire after shutdown; in-flight dispatches are
    // bounded by their own timeout.
    registry.shutdown().await;
    info!("Shut down");

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
