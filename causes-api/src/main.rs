mod config;
mod observability;

use causes::errors::CausesError;
use causes::model::CAUSE_ID;
use causes::store::{DynamoDbStore, InMemoryStore, KvStore};
use clap::{Args, Parser, Subcommand};
use config::{Config, ConfigError, StoreConfig};
use observability::MetricsError;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "causes-api", about = "Creates and updates causes")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Serve the upsert endpoint and the admin endpoints
    Run(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    #[arg(long)]
    config_path: PathBuf,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Metrics(#[from] MetricsError),
    #[error(transparent)]
    Causes(#[from] CausesError),
    #[error("could not start runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        CliCommand::Run(args) => run(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(args: RunArgs) -> Result<(), CliError> {
    let config = Config::from_file(&args.config_path)?;
    let _sentry = observability::init_logging(config.common.logging.as_ref());

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    rt.block_on(async move {
        if let Some(metrics) = &config.common.metrics {
            observability::init_metrics(metrics)?;
        }

        let store = get_store(config.store, &config.causes.table_name).await;
        causes::run(config.causes, store).await?;
        Ok::<(), CliError>(())
    })
}

async fn get_store(store: StoreConfig, table_name: &str) -> Arc<dyn KvStore> {
    match store {
        StoreConfig::Memory => {
            tracing::warn!("using in-memory store, causes are lost on restart");
            Arc::new(InMemoryStore::new().with_table(table_name, CAUSE_ID))
        }
        StoreConfig::Dynamodb {
            region,
            endpoint_url,
        } => Arc::new(DynamoDbStore::from_env(region, endpoint_url).await),
    }
}
