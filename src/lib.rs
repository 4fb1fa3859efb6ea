pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod entities;
pub mod guard;
pub mod models;
pub mod services;
pub mod state;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use cli::{ChannelCommands, Cli, Commands, PlaylistCommands};
pub use config::Config;
use metrics_exporter_prometheus::PrometheusHandle;
use state::SharedState;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Reads `path` if given, otherwise the first config file found.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    path.map_or_else(Config::load, Config::load_from_path)
}

pub async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    if matches!(cli.command, Some(Commands::Init)) {
        if Config::create_default_if_missing()? {
            println!("✓ Config file created. Edit config.toml and run again.");
        } else {
            println!("config.toml already exists, left untouched.");
        }
        return Ok(());
    }

    config.validate()?;

    let prometheus_handle = init_metrics(&config)?;
    init_tracing(&config)?;

    let Some(command) = cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(());
    };

    if matches!(command, Commands::Serve) {
        return run_server(config, prometheus_handle).await;
    }

    let state = SharedState::new(config).await?;

    match command {
        Commands::Serve | Commands::Init => Ok(()),
        Commands::Playlist { command } => match command {
            PlaylistCommands::List => cli::cmd_playlist_list(&state).await,
            PlaylistCommands::Add {
                name,
                url,
                disabled,
            } => cli::cmd_playlist_add(&state, &name, url, disabled).await,
            PlaylistCommands::Remove { id } => cli::cmd_playlist_remove(&state, &id).await,
            PlaylistCommands::Toggle { id, enabled } => {
                cli::cmd_playlist_toggle(&state, &id, enabled).await
            }
        },
        Commands::Channel { command } => match command {
            ChannelCommands::List { playlist, status } => {
                cli::cmd_channel_list(&state, playlist.as_deref(), status.as_deref()).await
            }
            ChannelCommands::Add {
                name,
                url,
                playlist,
            } => cli::cmd_channel_add(&state, &name, &url, playlist.as_deref()).await,
            ChannelCommands::Remove { id } => cli::cmd_channel_remove(&state, &id).await,
        },
        Commands::Import { playlist, file } => cli::cmd_import_m3u(&state, &playlist, &file).await,
        Commands::Refresh { playlist } => cli::cmd_refresh_playlist(&state, &playlist).await,
        Commands::Check { playlist, actor } => {
            cli::cmd_check_playlist(&state, &playlist, &actor).await
        }
        Commands::Summary => cli::cmd_summary(&state).await,
    }
}

fn init_metrics(config: &Config) -> anyhow::Result<Option<PrometheusHandle>> {
    if !config.observability.metrics_enabled {
        return Ok(None);
    }

    use metrics_exporter_prometheus::PrometheusBuilder;
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;
    Ok(Some(handle))
}

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer());

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let mut builder = tracing_loki::builder();
        for (key, value) in &config.observability.loki_labels {
            builder = builder.label(key.as_str(), value.as_str())?;
        }
        let (layer, task) = builder.build_url(url)?;

        tokio::spawn(task);

        registry.with(layer).init();
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    } else {
        registry.init();
    }

    Ok(())
}

async fn run_server(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<()> {
    info!("Chanarr v{} starting...", env!("CARGO_PKG_VERSION"));

    if !config.server.enabled {
        anyhow::bail!("server.enabled is false; nothing to serve");
    }

    let port = config.server.port;
    let shared = Arc::new(SharedState::new(config).await?);
    let app_state = api::create_app_state(shared, prometheus_handle).await;
    let app = api::router(app_state).await;

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Web API running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }
}
