//! Signal-Weights - Headless indicator-weight retraining service
//!
//! Periodically retrains the success classifier on closed prediction
//! outcomes and adapts the indicator weight vector. Results are pushed as
//! structured logs to stdout.
//!
//! # Usage
//! ```sh
//! RETRAIN_INTERVAL_SECS=3600 cargo run
//! cargo run -- --once --min-samples 100
//! ```
//!
//! # Environment Variables
//! - `DATA_MODE` - Outcome source: 'sqlite' or 'mock' (default: sqlite)
//! - `DATABASE_URL` - SQLite URL (default: sqlite://data/signals.db)
//! - `RETRAIN_MIN_SAMPLES` - Caller-level sample floor (default: 50)
//! - `RETRAIN_INTERVAL_SECS` - Seconds between cycles (default: 3600)

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use signal_weights::application::retrainer::RetrainPipeline;
use signal_weights::config::{Config, DataMode};
use signal_weights::domain::repositories::OutcomeRepository;
use signal_weights::infrastructure::InMemoryOutcomeRepository;
use signal_weights::infrastructure::persistence::database::Database;
use signal_weights::infrastructure::persistence::outcome_repository::SqliteOutcomeRepository;
use tracing::{Level, info, warn};
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Run a single retraining cycle and exit
    #[arg(long)]
    once: bool,

    /// Override RETRAIN_MIN_SAMPLES
    #[arg(long)]
    min_samples: Option<usize>,

    /// Override RETRAIN_INTERVAL_SECS
    #[arg(long)]
    interval_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Setup logging (stdout only)
    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false).pretty();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    info!("Signal-Weights {} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    let min_samples = args.min_samples.unwrap_or(config.min_samples);
    let interval_secs = args.interval_secs.unwrap_or(config.interval_secs);
    info!(
        "Configuration loaded: DataMode={:?}, MinSamples={}, Interval={}s",
        config.data_mode, min_samples, interval_secs
    );

    let source: Arc<dyn OutcomeRepository> = match config.data_mode {
        DataMode::Sqlite => {
            let database = Database::new(&config.database_url).await?;
            Arc::new(SqliteOutcomeRepository::new(database))
        }
        DataMode::Mock => Arc::new(InMemoryOutcomeRepository::new()),
    };

    let pipeline = RetrainPipeline::new(source);
    info!(
        "Initial weights: {:?}",
        pipeline.current_weights().await.as_map()
    );

    if args.once {
        run_cycle(&pipeline, min_samples).await;
        return Ok(());
    }

    let mut ticker = tokio::time::interval(std::time::Duration::from_secs(interval_secs));
    info!("Retraining loop running. Press Ctrl+C to shutdown.");

    loop {
        tokio::select! {
            _ = ticker.tick() => run_cycle(&pipeline, min_samples).await,
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received. Exiting...");
                break;
            }
        }
    }

    Ok(())
}

async fn run_cycle(pipeline: &RetrainPipeline, min_samples: usize) {
    match pipeline.retrain(min_samples).await {
        Ok(result) => {
            info!(
                training_samples = result.training_samples,
                accuracy = result.model_performance.accuracy,
                precision = result.model_performance.precision,
                recall = result.model_performance.recall,
                "Retrain succeeded"
            );
            info!("Updated weights: {:?}", result.indicator_weights.as_map());
        }
        // Weights are untouched on any failure; next tick retries from scratch.
        Err(e) => warn!("Retrain cycle failed: {}", e),
    }
}
