//! Training binary entry point.
//!
//! Fits the theme classifier on a grant dataset and writes the model artifact
//! used by `recommend` and `recommend_server`.
//!
//! # Examples
//!
//! ```bash
//! train --input grants_final.tsv --output model.json
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Table};
use indicatif::{ProgressBar, ProgressStyle};
use researcher_recommend::{
    classifier::train::{fit_with_progress, save_artifact, TrainOptions, TrainedModel},
    provider::open_provider,
};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Training CLI for the title-to-theme model
#[derive(Parser, Debug)]
#[command(
    name = "train",
    version,
    about = "Fit the theme classifier from a grant dataset",
    long_about = "Fit a multinomial logistic regression over TF-IDF title features with balanced \
                  class weights, then write the model artifact as JSON.

EXAMPLES:
  Default settings:
    train --input grants_final.tsv --output model.json

  Larger vocabulary and more iterations:
    train --input grants.json --max-features 1000 --max-iter 5000

  Keep themes with a single record:
    train --input grants.json --min-samples 1 --log-level debug"
)]
struct TrainArgs {
    /// Grant dataset (.json, .tsv or .txt)
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// Where to write the model artifact
    #[arg(short, long, value_name = "FILE", default_value = "model.json")]
    output: PathBuf,

    /// Vocabulary size of the title vectorizer
    #[arg(long, value_name = "N", default_value = "500")]
    max_features: usize,

    /// Inverse regularization strength
    #[arg(long, value_name = "C", default_value = "0.5")]
    c: f64,

    /// Maximum gradient descent iterations
    #[arg(long, value_name = "N", default_value = "2000")]
    max_iter: usize,

    /// Themes with fewer records are left out of the label set
    #[arg(long, value_name = "N", default_value = "2")]
    min_samples: usize,

    /// Logging verbosity level
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

/// Initialize logging subsystem with the specified level
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Create a progress bar over training iterations
fn create_progress_bar(total: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} iterations | loss: {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("##-"),
    );
    Ok(pb)
}

fn class_table(model: &TrainedModel) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        Cell::new("Theme").add_attribute(Attribute::Bold),
        Cell::new("Records").add_attribute(Attribute::Bold),
        Cell::new("Class weight").add_attribute(Attribute::Bold),
    ]);
    let artifact = &model.artifact;
    for ((label, count), weight) in artifact
        .labels
        .iter()
        .zip(&model.class_counts)
        .zip(&artifact.class_weights)
    {
        table.add_row(vec![
            Cell::new(label),
            Cell::new(count),
            Cell::new(format!("{:.4}", weight)),
        ]);
    }
    table
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = TrainArgs::parse();

    init_logging(&args.log_level);
    info!("Starting theme classifier training");
    debug!("CLI arguments: {:?}", args);

    let start_time = Instant::now();

    let provider = open_provider(&args.input)
        .await
        .with_context(|| format!("Failed to load dataset from {:?}", args.input))?;
    let records = provider
        .fetch_records()
        .await
        .context("Failed to read grant records")?;
    let load_stats = provider.stats();
    info!("Loaded {} records from {}", records.len(), provider.name());

    if records.is_empty() {
        anyhow::bail!("No usable records in {:?}", args.input);
    }

    let options = TrainOptions {
        max_features: args.max_features,
        c: args.c,
        max_iter: args.max_iter,
        min_samples_per_theme: args.min_samples,
        ..TrainOptions::default()
    };

    let progress = create_progress_bar(options.max_iter)?;
    let pb = progress.clone();
    let model = tokio::task::spawn_blocking(move || {
        fit_with_progress(&records, &options, |iteration, loss| {
            pb.set_position(iteration as u64);
            pb.set_message(format!("{:.6}", loss));
        })
    })
    .await
    .context("Training task panicked")?
    .context("Failed to fit theme classifier")?;
    progress.finish_with_message(format!("{:.6}", model.final_loss));

    if !model.excluded_themes.is_empty() {
        warn!(
            "Excluded {} themes with too few records: {}",
            model.excluded_themes.len(),
            model.excluded_themes.join(", ")
        );
    }

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {:?}", parent))?;
    }
    save_artifact(&model.artifact, &args.output)
        .with_context(|| format!("Failed to write model to {:?}", args.output))?;

    println!("\n{}", class_table(&model));

    let elapsed = start_time.elapsed();
    println!("\n╔════════════════════════════════════════╗");
    println!("║      Training Completed                ║");
    println!("╠════════════════════════════════════════╣");
    println!("║ Records loaded:       {:>16} ║", load_stats.loaded);
    println!("║ Rows skipped:         {:>16} ║", load_stats.skipped);
    println!("║ Labels:               {:>16} ║", model.artifact.labels.len());
    println!("║ Vocabulary:           {:>16} ║", model.artifact.vectorizer.vocabulary_size());
    println!("║ Iterations:           {:>16} ║", model.iterations);
    println!("║ Final loss:           {:>16.6} ║", model.final_loss);
    println!("║ Elapsed time:         {:>13.2?} ║", elapsed);
    println!("╚════════════════════════════════════════╝");

    info!("Model written to {:?}", args.output);

    Ok(())
}
