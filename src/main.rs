use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gh_mock_server::api::build_router;
use gh_mock_server::config::{loader::load_fault_preset, AppConfig};
use gh_mock_server::state::AppState;

#[derive(Parser)]
#[command(name = "gh-mock-server")]
#[command(about = "Mock GitHub REST and GraphQL API backed by fixture directories")]
#[command(version)]
struct Cli {
    /// User root holding one directory per repository
    data_dir: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Delay added to every successful API response, in milliseconds
    #[arg(long)]
    latency: Option<u64>,

    /// Log requests at debug level only
    #[arg(long)]
    silent: bool,

    /// YAML or JSON fault preset, re-applied after every reset
    #[arg(long)]
    faults: Option<PathBuf>,

    /// Base URL written into generated links
    #[arg(long)]
    public_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gh_mock_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load().context("loading configuration")?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(port) = cli.port {
        config.server_port = port;
    }
    if let Some(host) = cli.host {
        config.server_host = host;
    }
    if let Some(latency) = cli.latency {
        config.latency_ms = latency;
    }
    if cli.silent {
        config.silent = true;
    }
    if let Some(faults) = cli.faults {
        config.fault_file = Some(faults);
    }
    if let Some(public_url) = cli.public_url {
        config.public_url = Some(public_url);
    }
    info!("Serving fixtures from {:?} as {}", config.data_dir, config.owner());

    let preset = config
        .fault_file
        .as_deref()
        .map(load_fault_preset)
        .transpose()
        .context("loading fault preset")?;

    let host = config.server_host.clone();
    let port = config.server_port;
    let state = AppState::new(config, preset).context("scanning repositories")?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("binding {}:{}", host, port))?;
    info!("Mock GitHub server listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
