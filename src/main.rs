use std::path::PathBuf;

use clap::Parser;
use routex::{RoutexServer, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Serves the demo route table on a thread-per-core router.
#[derive(Parser, Debug)]
#[command(name = "routex")]
#[command(author, version, about = "Thread-per-core HTTP route dispatcher")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the worker count (0 = one per CPU)
    #[arg(short, long)]
    threads: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(threads) = cli.threads {
        config.threads = threads;
    }

    let builder = routex::demo::routes().with_config(config);
    let handle = RoutexServer::from_builder(builder)?.start()?;
    tracing::info!("routex listening on http://{}", handle.local_addr());

    tokio::signal::ctrl_c().await?;
    tracing::info!("Interrupt received, stopping workers");
    tokio::task::spawn_blocking(move || handle.shutdown()).await??;
    Ok(())
}
