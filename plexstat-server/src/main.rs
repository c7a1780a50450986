//! # plexstat
//!
//! Prometheus exporter for Plex library statistics.
//!
//! Walks every Plex library on a fixed schedule, tracks each media variant,
//! and exposes item counts and byte sizes partitioned by audio channels,
//! audio codec, media type, video codec and video resolution.

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use clap::Parser;
use plexstat_config::{ConfigLoad, ConfigLoader, ConfigOverrides};
use plexstat_server::{
    infra::startup::{bootstrap, build_plex_client, scheduler_config},
    routes,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "plexstat", version)]
#[command(about = "Prometheus exporter for Plex library statistics")]
struct Cli {
    /// Plex server base URL, e.g. http://127.0.0.1:32400
    #[arg(short, long, env = "PLEX_URL")]
    url: Option<String>,

    /// Plex authentication token
    #[arg(short, long, env = "PLEX_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Port to serve metrics on (overrides config)
    #[arg(short, long, env = "HTTP_PORT")]
    port: Option<u16>,

    /// Address to bind (overrides config)
    #[arg(long, env = "HTTP_HOST")]
    host: Option<String>,

    /// Time between refresh cycles, e.g. 10m
    #[arg(long, env = "REFRESH_INTERVAL", value_parser = humantime::parse_duration)]
    refresh_interval: Option<Duration>,

    /// Path to a plexstat.toml
    #[arg(short, long, env = "PLEXSTAT_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new().with_overrides(ConfigOverrides {
        plex_url: cli.url,
        plex_token: cli.token,
        http_host: cli.host,
        http_port: cli.port,
        refresh_interval: cli.refresh_interval,
    });
    if let Some(path) = cli.config {
        loader = loader.with_config_path(path);
    }
    let ConfigLoad { config, warnings } =
        loader.load().context("failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                // Override via RUST_LOG.
                "info,refresh::summary=info,tower_http=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    for warning in &warnings.items {
        match &warning.hint {
            Some(hint) => {
                warn!(message = %warning.message, hint = %hint, "configuration warning")
            }
            None => warn!(message = %warning.message, "configuration warning"),
        }
    }
    info!(
        plex_url = %config.plex.url,
        refresh_interval = %humantime::format_duration(config.refresh.interval),
        config_path = ?config.metadata.config_path,
        env_file_loaded = config.metadata.env_file_loaded,
        "configuration loaded"
    );

    let client = build_plex_client(&config.plex)?;
    let collector = bootstrap(client, scheduler_config(&config)).await?;

    let shutdown = collector.scheduler.shutdown_token();
    let refresh_task = Arc::clone(&collector.scheduler).spawn();

    let bind_addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    info!(addr = %bind_addr, "serving metrics on /metrics");

    let app = routes::create_router(collector.state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server failed")?;

    shutdown.cancel();
    if let Err(err) = refresh_task.await {
        warn!(error = %err, "refresh task ended abnormally");
    }
    info!("shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("shutdown signal received");
}
