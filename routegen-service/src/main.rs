//! Routegen
//!
//! Runs the routing generator against a topology file and keeps an in-process
//! router loaded with the resulting table. `SIGHUP` re-reads the topology file.

#![deny(missing_docs)]

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::select;
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use routegen_core::SwapRouter;
use routegen_service::{FileTopologySource, GeneratorConfig, RoutingGenerator};

/// Command line options.
#[derive(Debug, Parser)]
#[command(name = "routegen", about = "Generates routing tables from the deployed topology")]
struct Options {
    /// JSON configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// JSON topology snapshot; overrides `topology_path` from the configuration.
    #[arg(long)]
    topology: Option<PathBuf>,
}

/// `RUST_LOG` wins over the configured level, which defaults to `info`.
fn init_tracing(log_level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .ok()
        .or_else(|| log_level.and_then(|level| EnvFilter::builder().parse(level).ok()))
        .unwrap_or_else(|| {
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .parse_lossy("")
        });
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Loads the configuration, starts the generator and runs until interrupted.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let options = Options::parse();
    let mut config = match &options.config {
        Some(path) => GeneratorConfig::load(path)?,
        None => GeneratorConfig::default(),
    };
    if let Some(topology) = options.topology {
        config.topology_path = Some(topology);
    }
    init_tracing(config.log_level.as_deref());

    let Some(topology_path) = config.topology_path.clone() else {
        return Err("no topology file configured, pass --topology or set topology_path".into());
    };
    info!("Reading topology from {}", topology_path.display());

    let router = Arc::new(SwapRouter::new());
    let generator = RoutingGenerator::new(
        Arc::new(FileTopologySource::new(topology_path)),
        Arc::clone(&router) as Arc<dyn routegen_core::Router>,
        config,
    );
    generator.start()?;

    let notifier = generator.notifier();
    let mut hangup = signal(SignalKind::hangup())?;
    loop {
        select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                info!("CTRL+C caught, shutting down");
                break;
            },
            _ = hangup.recv() => {
                info!("SIGHUP caught, reloading topology");
                notifier.notify();
            },
        }
    }
    generator.shutdown();
    info!("Router performed {} table loads", router.loads());
    Ok(())
}
