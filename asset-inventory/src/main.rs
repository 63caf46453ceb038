use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use asset_inventory::config::{RunOptions, DEFAULT_CONFIG_PATH};
use asset_inventory::{Dependencies, EtlError};
use asset_inventory_pipeline::ServiceStrategy;

#[derive(Parser)]
#[command(name = "asset-inventory")]
#[command(about = "Derive infrastructure assets from telemetry and write them to the asset indices", long_about = None)]
struct Cli {
    /// Name of the cluster in the config file used for reading telemetry
    #[arg(long)]
    read: String,

    /// Name of the cluster in the config file used for writing assets (defaults to --read)
    #[arg(long)]
    write: Option<String>,

    /// Path of the cluster config file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// How services are collected (aggregation|linear|summaries)
    #[arg(long, default_value = "aggregation")]
    service_strategy: ServiceStrategy,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn run(cli: Cli) -> Result<(), EtlError> {
    let options = RunOptions {
        read: cli.read,
        write: cli.write,
        config_path: cli.config,
        service_strategy: cli.service_strategy,
    };

    let dependencies = Dependencies::new(&options).await?;
    let summary = dependencies.orchestrator.run().await?;

    info!(batches = summary.batches.len(), "Finished running ETL");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!(error = %e, "ETL run failed");

        let mut source = e.source();
        while let Some(err) = source {
            error!("  Caused by: {}", err);
            source = err.source();
        }

        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
