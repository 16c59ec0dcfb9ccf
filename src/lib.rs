//! Researcher Recommend - ranks past grant researchers for a new project title.
//!
//! Given the title of a proposed research project, the engine predicts its
//! research theme, gathers every researcher with history in that theme, and
//! ranks them with an additive, explainable score.
//!
//! # Architecture
//!
//! - **models**: Core data structures (GrantRecord, ResearcherProfile, ScoreBreakdown, etc.)
//! - **text**: Title normalization, tokenization and the TF-IDF vectorizer
//! - **provider**: Dataset loading from JSON and TSV exports
//! - **repository**: Immutable in-memory grant records
//! - **classifier**: Title-to-theme models and the offline fitter
//! - **similarity**: Bounded title similarity and keyword tiers
//! - **aggregate**: Per-researcher statistics scoped to a theme
//! - **scoring**: Four-component score breakdown
//! - **recommend**: The orchestrator and its immutable engine context
//! - **config**: Layered TOML / env / CLI configuration
//! - **server**: Line-delimited JSON request loop
//!
//! # Workflow
//!
//! ## Offline Training
//!
//! 1. Load grant records from a dataset export
//! 2. Fit TF-IDF features and a multinomial logistic model
//! 3. Write the model artifact as JSON
//!
//! ## Online Recommendation
//!
//! 1. Validate the title and result count
//! 2. Predict the theme (or take the caller's override)
//! 3. Aggregate researcher profiles for that theme
//! 4. Score every candidate and sort by total, then name
//! 5. Return the top N with their related titles
//!
//! # Example
//!
//! ```ignore
//! use researcher_recommend::{
//!     classifier::LinearThemeClassifier,
//!     config::EngineConfig,
//!     provider::open_provider,
//!     recommend::EngineContext,
//!     repository::GrantRepository,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = open_provider("grants_final.tsv".as_ref()).await?;
//!     let repository = GrantRepository::new(provider.fetch_records().await?);
//!     let classifier = LinearThemeClassifier::load("model.json".as_ref())?;
//!     let context = EngineContext::new(repository, classifier, &EngineConfig::default());
//!
//!     let result = context
//!         .orchestrator()
//!         .recommend("Quantum Sensing for Robotics", None, 5, 2026)?;
//!     for entry in result.ranked {
//!         println!("{}: {:.1}", entry.researcher, entry.score.total);
//!     }
//!     Ok(())
//! }
//! ```

pub mod aggregate;
pub mod classifier;
pub mod config;
pub mod models;
pub mod provider;
pub mod recommend;
pub mod repository;
pub mod scoring;
pub mod server;
pub mod similarity;
pub mod text;

// Re-export commonly used types at the crate root
pub use classifier::{LinearThemeClassifier, ThemeClassifier, ThemePrediction};
pub use config::EngineConfig;
pub use models::{GrantRecord, RankedResearcher, RecommendationResult, ResearcherProfile, ScoreBreakdown};
pub use provider::GrantProvider;
pub use recommend::{EngineContext, RecommendError, RecommendationOrchestrator};
pub use repository::GrantRepository;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
