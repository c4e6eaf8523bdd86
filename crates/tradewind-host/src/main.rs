//! Tradewind platform host binary

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use tradewind_core::PlatformConfig;
use tradewind_host::{PlatformCoreModule, PlatformHost};

#[derive(Debug, Parser)]
#[command(name = "tradewind", about = "Tradewind commerce platform host")]
struct Args {
    /// Path to the platform configuration file
    #[arg(long, default_value = "tradewind.toml")]
    config: PathBuf,

    /// Log filter, e.g. "info" or "tradewind_lock=debug"
    #[arg(long, default_value = "info")]
    log: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log)),
        )
        .init();

    let config = PlatformConfig::load_from_file(&args.config)?;
    let host = PlatformHost::builder(config)
        .with_module(Arc::new(PlatformCoreModule))
        .with_setting_default("platform.title", "Tradewind")
        .build()?;

    // Startup blocks on the bootstrap critical section; a failure here is
    // fatal and the process exits without serving.
    host.bootstrap().await?;
    tracing::info!("tradewind host ready");

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    Ok(())
}
