//! Recommendation server binary entry point.
//!
//! Loads the dataset and model once, then answers line-delimited JSON
//! requests on stdin with one JSON line each on stdout.
//!
//! ```bash
//! echo '{"project_title": "Quantum Sensing", "top_n": 3}' | \
//!     recommend_server --dataset grants_final.tsv --model model.json
//! ```

use anyhow::{Context, Result};
use chrono::Datelike;
use clap::Parser;
use researcher_recommend::{
    classifier::LinearThemeClassifier,
    config::{CliOverrides, EngineConfig},
    provider::open_provider,
    recommend::EngineContext,
    repository::GrantRepository,
    server::{RecommendServer, ServerConfig},
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Stdio recommendation server
#[derive(Parser, Debug)]
#[command(name = "recommend_server", version, about = "Serve recommendations over stdin/stdout")]
struct Args {
    /// Grant dataset (.json, .tsv or .txt)
    #[arg(long, value_name = "PATH")]
    dataset: PathBuf,

    /// Trained theme model artifact (JSON)
    #[arg(long, value_name = "PATH")]
    model: PathBuf,

    /// Configuration file (TOML)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Default number of researchers per request
    #[arg(long, value_name = "N")]
    top_n: Option<usize>,

    /// Default reference year for recency scoring
    #[arg(long, value_name = "YEAR")]
    current_year: Option<i32>,

    /// Logging verbosity level
    #[arg(long, default_value = "info", value_name = "LEVEL")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)))
        .init();

    let overrides = CliOverrides {
        top_n: args.top_n,
        current_year: args.current_year,
    };
    let config = EngineConfig::load(args.config.as_deref(), &overrides)
        .context("Failed to load configuration")?;

    let provider = open_provider(&args.dataset)
        .await
        .with_context(|| format!("Failed to open dataset {}", args.dataset.display()))?;
    let records = provider
        .fetch_records()
        .await
        .context("Failed to read grant records")?;

    let classifier = LinearThemeClassifier::load(&args.model)
        .with_context(|| format!("Failed to load model {}", args.model.display()))?;

    let context = EngineContext::new(GrantRepository::new(records), classifier, &config);
    let server_config = ServerConfig::from_engine(&config, chrono::Local::now().year());
    info!(
        default_top_n = server_config.default_top_n,
        current_year = server_config.current_year,
        "Server ready, reading requests from stdin"
    );

    let stats = RecommendServer::new(&context, server_config)
        .run(tokio::io::stdin(), tokio::io::stdout())
        .await
        .context("Server loop failed")?;

    info!(handled = stats.handled, failed = stats.failed, "Server stopped");
    Ok(())
}
