//! Recommend binary entry point.
//!
//! Ranks past researchers for a project title using a grant dataset and a
//! trained theme model. Supports single-query and interactive REPL modes with
//! table or JSON output.
//!
//! # Examples
//!
//! Single query:
//! ```bash
//! recommend --dataset grants_final.tsv --model model.json --query "Quantum Sensing for Robotics"
//! ```
//!
//! Interactive mode:
//! ```bash
//! recommend --dataset grants_final.tsv --model model.json --interactive
//! ```

use anyhow::{Context, Result};
use chrono::Datelike;
use clap::{Parser, ValueEnum};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use researcher_recommend::{
    classifier::{LinearThemeClassifier, ThemeClassifier},
    config::{CliOverrides, EngineConfig},
    models::{RankedResearcher, RecommendationResult},
    provider::open_provider,
    recommend::EngineContext,
    repository::GrantRepository,
};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Output format for recommendations
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-friendly table with colored keyword tiers
    Table,
    /// Machine-readable JSON format
    Json,
}

/// Recommend binary CLI
#[derive(Parser, Debug)]
#[command(
    name = "recommend",
    version,
    about = "Recommend researchers for a project title",
    long_about = "Predict the research theme of a project title and rank past researchers \
                  in that theme by an explainable score.

EXAMPLES:
  Single query:
    recommend --dataset grants_final.tsv --model model.json --query \"Quantum Sensing\"

  Force a theme and return 10 researchers:
    recommend --dataset grants.json --model model.json --query \"Robot Arms\" --theme Robotics --top-n 10

  Show theme posteriors only:
    recommend --dataset grants.json --model model.json --query \"Clinical AI\" --classify-only

  Interactive mode:
    recommend --dataset grants_final.tsv --model model.json --interactive"
)]
struct Args {
    /// Grant dataset (.json, .tsv or .txt)
    #[arg(long, value_name = "PATH")]
    dataset: PathBuf,

    /// Trained theme model artifact (JSON)
    #[arg(long, value_name = "PATH")]
    model: PathBuf,

    /// Project title (required unless --interactive)
    #[arg(long, value_name = "TEXT", conflicts_with = "interactive")]
    query: Option<String>,

    /// Skip classification and use this theme
    #[arg(long, value_name = "THEME")]
    theme: Option<String>,

    /// Number of researchers to return
    #[arg(long, value_name = "N")]
    top_n: Option<usize>,

    /// Reference year for recency scoring (default: current year)
    #[arg(long, value_name = "YEAR")]
    current_year: Option<i32>,

    /// Configuration file (TOML)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Print ranked theme scores instead of researchers
    #[arg(long, conflicts_with = "interactive")]
    classify_only: bool,

    /// Enable interactive REPL mode
    #[arg(long, short = 'i')]
    interactive: bool,

    /// Logging verbosity level
    #[arg(long, default_value = "warn", value_name = "LEVEL")]
    log_level: String,
}

/// Mutable REPL settings
struct Session {
    top_n: usize,
    theme: Option<String>,
    current_year: i32,
    format: OutputFormat,
}

/// Setup logging with the specified level
fn setup_logging(log_level: &str) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .init();
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

/// Format a recommendation as a pretty table
fn format_result_table(result: &RecommendationResult, high_keyword: f64) -> String {
    let mut out = format!(
        "Theme: {} (confidence {:.2})\n",
        result.predicted_theme, result.confidence
    );
    if result.ranked.is_empty() {
        out.push_str("No researchers found for this theme.");
        return out;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Rank").add_attribute(Attribute::Bold),
        Cell::new("Researcher").add_attribute(Attribute::Bold),
        Cell::new("Total").add_attribute(Attribute::Bold),
        Cell::new("Theme").add_attribute(Attribute::Bold),
        Cell::new("Keyword").add_attribute(Attribute::Bold),
        Cell::new("Contrib").add_attribute(Attribute::Bold),
        Cell::new("Recency").add_attribute(Attribute::Bold),
        Cell::new("Related titles").add_attribute(Attribute::Bold),
    ]);

    for (idx, entry) in result.ranked.iter().enumerate() {
        let s = &entry.score;
        let keyword_color = if s.keyword_score >= high_keyword {
            Color::Green
        } else if s.keyword_score > 0.0 {
            Color::Yellow
        } else {
            Color::White
        };
        let related = match entry.related_titles.first() {
            Some(first) if entry.related_titles.len() > 1 => format!(
                "{} (+{} more)",
                truncate(first, 40),
                entry.related_titles.len() - 1
            ),
            Some(first) => truncate(first, 50),
            None => String::new(),
        };

        table.add_row(vec![
            Cell::new(idx + 1),
            Cell::new(truncate(&entry.researcher, 30)),
            Cell::new(format!("{:.1}", s.total)).add_attribute(Attribute::Bold),
            Cell::new(format!("{:.1}", s.theme_score)),
            Cell::new(format!("{:.1}", s.keyword_score)).fg(keyword_color),
            Cell::new(format!("{:.1}", s.contribution_score)),
            Cell::new(format!("{:.1}", s.recency_score)),
            Cell::new(related),
        ]);
    }

    out.push_str(&table.to_string());
    out
}

/// Format a recommendation as JSON
fn format_result_json(result: &RecommendationResult) -> Result<String> {
    serde_json::to_string_pretty(result).with_context(|| "Failed to serialize result to JSON")
}

/// Display detailed view of a single ranked researcher
fn display_detail(entry: &RankedResearcher, rank: usize) {
    let s = &entry.score;
    println!("\n{}", "═".repeat(80));
    println!("Rank: {}", rank);
    println!("Researcher: {}", entry.researcher);
    println!("Total: {:.2}", s.total);
    println!("  theme        {:>8.2}", s.theme_score);
    println!("  keyword      {:>8.2}", s.keyword_score);
    println!("  contribution {:>8.2}", s.contribution_score);
    println!("  recency      {:>8.2}", s.recency_score);
    println!("\nRelated titles:");
    for title in &entry.related_titles {
        println!("  - {}", title);
    }
    println!("{}", "═".repeat(80));
}

/// Print every theme with its score, best first
fn print_theme_ranking<C: ThemeClassifier>(classifier: &C, title: &str, format: OutputFormat) -> Result<()> {
    let ranking = classifier
        .rank_themes(title)
        .with_context(|| format!("Failed to classify '{}'", title))?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&ranking)
                .with_context(|| "Failed to serialize theme ranking")?;
            println!("{}", json);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table.load_preset(UTF8_FULL).set_header(vec![
                Cell::new("Rank").add_attribute(Attribute::Bold),
                Cell::new("Theme").add_attribute(Attribute::Bold),
                Cell::new("Score").add_attribute(Attribute::Bold),
            ]);
            for (idx, entry) in ranking.iter().enumerate() {
                let theme = Cell::new(&entry.theme);
                table.add_row(vec![
                    Cell::new(idx + 1),
                    if idx == 0 { theme.fg(Color::Green) } else { theme },
                    Cell::new(format!("{:.4}", entry.score)),
                ]);
            }
            println!("{}", table);
        }
    }
    Ok(())
}

fn print_result<C: ThemeClassifier>(
    context: &EngineContext<C>,
    result: &RecommendationResult,
    format: OutputFormat,
    elapsed_secs: f64,
) -> Result<()> {
    match format {
        OutputFormat::Table => {
            let high = context.scoring().weights().high_tier_floor();
            println!("{}", format_result_table(result, high));
            println!(
                "\n{} researchers in {:.3}s",
                result.ranked.len(),
                elapsed_secs
            );
        }
        OutputFormat::Json => println!("{}", format_result_json(result)?),
    }
    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  <title>          - Recommend researchers for a project title");
    println!("  /top N           - Set number of researchers to N");
    println!("  /theme THEME     - Force a theme (skips classification)");
    println!("  /theme clear     - Predict the theme again");
    println!("  /themes          - List themes present in the dataset");
    println!("  /classify TITLE  - Show theme scores for a title");
    println!("  /year YEAR       - Set the reference year for recency");
    println!("  /format table    - Use table output format");
    println!("  /format json     - Use JSON output format");
    println!("  /detail N        - Show full breakdown for rank N");
    println!("  /help            - Show this help");
    println!("  Ctrl+D or Ctrl+C - Exit");
}

/// Run interactive REPL mode
fn run_interactive<C: ThemeClassifier>(context: &EngineContext<C>, mut session: Session) -> Result<()> {
    println!("Interactive Researcher Recommendation");
    print_help();
    println!();

    let mut rl = DefaultEditor::new().with_context(|| "Failed to create readline editor")?;
    let mut last: Option<RecommendationResult> = None;

    loop {
        match rl.readline("Recommend> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                rl.add_history_entry(line).ok();

                if let Some(command) = line.strip_prefix('/') {
                    let (name, rest) = command
                        .split_once(char::is_whitespace)
                        .map(|(n, r)| (n, r.trim()))
                        .unwrap_or((command, ""));
                    match name {
                        "help" => print_help(),
                        "top" => match rest.parse::<usize>() {
                            Ok(n) if n > 0 => {
                                session.top_n = n;
                                println!("Set top-n to {}", n);
                            }
                            _ => eprintln!("Usage: /top N (positive integer)"),
                        },
                        "theme" => match rest {
                            "" => eprintln!("Usage: /theme THEME  or  /theme clear"),
                            "clear" => {
                                session.theme = None;
                                println!("Theme override cleared");
                            }
                            theme if context.repository().contains_theme(theme) => {
                                session.theme = Some(theme.to_string());
                                println!("Theme forced to {}", theme);
                            }
                            theme => eprintln!("Unknown theme: {}. Try /themes.", theme),
                        },
                        "themes" => {
                            for theme in context.repository().themes() {
                                println!("  {}", theme);
                            }
                        }
                        "classify" if !rest.is_empty() => {
                            if let Err(e) = print_theme_ranking(context.classifier(), rest, session.format) {
                                eprintln!("{:#}", e);
                            }
                        }
                        "classify" => eprintln!("Usage: /classify TITLE"),
                        "year" => match rest.parse::<i32>() {
                            Ok(year) => {
                                session.current_year = year;
                                println!("Reference year set to {}", year);
                            }
                            Err(_) => eprintln!("Usage: /year YEAR"),
                        },
                        "format" => match rest {
                            "table" => {
                                session.format = OutputFormat::Table;
                                println!("Set output format to table");
                            }
                            "json" => {
                                session.format = OutputFormat::Json;
                                println!("Set output format to JSON");
                            }
                            _ => eprintln!("Usage: /format [table|json]"),
                        },
                        "detail" => {
                            let ranked = last.as_ref().map(|r| r.ranked.as_slice()).unwrap_or(&[]);
                            match rest.parse::<usize>() {
                                Ok(rank) if rank > 0 && rank <= ranked.len() => {
                                    display_detail(&ranked[rank - 1], rank);
                                }
                                Ok(rank) if rank > ranked.len() => eprintln!(
                                    "Rank {} out of range (last query returned {})",
                                    rank,
                                    ranked.len()
                                ),
                                _ => eprintln!("Usage: /detail N (positive integer)"),
                            }
                        }
                        _ => eprintln!("Unknown command: /{}. Type /help for available commands.", name),
                    }
                } else {
                    let start = Instant::now();
                    match context.orchestrator().recommend(
                        line,
                        session.theme.as_deref(),
                        session.top_n,
                        session.current_year,
                    ) {
                        Ok(result) => {
                            print_result(context, &result, session.format, start.elapsed().as_secs_f64())?;
                            last = Some(result);
                        }
                        Err(e) => eprintln!("Recommendation failed: {}", e),
                    }
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                error!("Error reading input: {}", err);
                break;
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(&args.log_level);

    if !args.interactive && args.query.is_none() {
        anyhow::bail!(
            "Either --query or --interactive must be specified.\n\
             Use --help for usage information."
        );
    }

    let overrides = CliOverrides {
        top_n: args.top_n,
        current_year: args.current_year,
    };
    let config = EngineConfig::load(args.config.as_deref(), &overrides)
        .with_context(|| "Failed to load configuration")?;
    debug!(?config, "resolved configuration");

    info!("Loading dataset from: {}", args.dataset.display());
    let provider = open_provider(&args.dataset)
        .await
        .with_context(|| format!("Failed to open dataset {}", args.dataset.display()))?;
    let records = provider
        .fetch_records()
        .await
        .with_context(|| "Failed to read grant records")?;
    if records.is_empty() {
        anyhow::bail!(
            "Dataset is empty ({} rows skipped).\n\
             Check the column headers and delimiter.",
            provider.stats().skipped
        );
    }

    let classifier = LinearThemeClassifier::load(&args.model)
        .with_context(|| format!("Failed to load model {}", args.model.display()))?;

    let context = EngineContext::new(GrantRepository::new(records), classifier, &config);

    let session = Session {
        top_n: config.recommend.default_top_n,
        theme: args.theme,
        current_year: config
            .recommend
            .current_year
            .unwrap_or_else(|| chrono::Local::now().year()),
        format: args.format,
    };

    match args.query {
        Some(title) if args.classify_only => {
            print_theme_ranking(context.classifier(), &title, session.format)?;
        }
        Some(title) => {
            let start = Instant::now();
            let result = context
                .orchestrator()
                .recommend(&title, session.theme.as_deref(), session.top_n, session.current_year)
                .with_context(|| format!("Failed to recommend researchers for '{}'", title))?;
            print_result(&context, &result, session.format, start.elapsed().as_secs_f64())?;
        }
        None => run_interactive(&context, session)?,
    }

    Ok(())
}
