//! Line-delimited JSON request server.
//!
//! Each input line is one [`RecommendRequest`]; each output line is either a
//! serialized [`RecommendationResult`] or an [`ErrorResponse`] carrying an
//! HTTP-style status code. A malformed line produces an error line and the
//! loop keeps going; EOF ends it.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::classifier::ThemeClassifier;
use crate::config::EngineConfig;
use crate::models::RecommendationResult;
use crate::recommend::{EngineContext, RecommendError};

/// Errors that end the serve loop.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Request payload, matching the `recommend_researchers` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendRequest {
    pub project_title: String,

    /// Manual theme override; blank means "predict"
    #[serde(default)]
    pub target_theme: Option<String>,

    /// Number of researchers to return; falls back to the server default
    #[serde(default)]
    pub top_n: Option<i64>,

    /// Reference year for recency; falls back to the server default
    #[serde(default)]
    pub current_year: Option<i32>,
}

impl RecommendRequest {
    /// The override, if non-blank.
    pub fn theme_override(&self) -> Option<&str> {
        self.target_theme
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// Error line payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
    pub status: u16,
}

impl ErrorResponse {
    pub fn unparsable(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            status: 422,
        }
    }
}

impl From<&RecommendError> for ErrorResponse {
    fn from(err: &RecommendError) -> Self {
        let status = match err {
            RecommendError::InvalidInput(_) => 400,
            RecommendError::UnknownTheme(_) => 404,
            RecommendError::ModelUnavailable(_) => 503,
        };
        Self {
            error: err.to_string(),
            status,
        }
    }
}

/// One response line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Response {
    Ok(RecommendationResult),
    Err(ErrorResponse),
}

/// Server defaults applied to requests that omit them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    pub default_top_n: usize,
    pub current_year: i32,
}

impl ServerConfig {
    /// Take defaults from `config`, using `wall_clock_year` when no reference
    /// year is configured.
    pub fn from_engine(config: &EngineConfig, wall_clock_year: i32) -> Self {
        Self {
            default_top_n: config.recommend.default_top_n,
            current_year: config.recommend.current_year.unwrap_or(wall_clock_year),
        }
    }
}

/// Summary of one serve loop.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ServeStats {
    pub handled: usize,
    pub failed: usize,
}

/// Request handler over a shared engine context.
pub struct RecommendServer<'a, C> {
    context: &'a EngineContext<C>,
    config: ServerConfig,
}

impl<'a, C: ThemeClassifier> RecommendServer<'a, C> {
    pub fn new(context: &'a EngineContext<C>, config: ServerConfig) -> Self {
        Self { context, config }
    }

    /// Process one request.
    pub fn handle(&self, request: &RecommendRequest) -> Response {
        let requested = request
            .top_n
            .unwrap_or(self.config.default_top_n as i64);
        if requested <= 0 {
            return Response::Err(ErrorResponse::from(&RecommendError::InvalidInput(
                format!("top_n must be a positive integer, got {}", requested),
            )));
        }

        let top_n = usize::try_from(requested).unwrap_or(usize::MAX);
        let year = request.current_year.unwrap_or(self.config.current_year);
        match self.context.orchestrator().recommend(
            &request.project_title,
            request.theme_override(),
            top_n,
            year,
        ) {
            Ok(result) => Response::Ok(result),
            Err(err) => {
                warn!(error = %err, "request rejected");
                Response::Err(ErrorResponse::from(&err))
            }
        }
    }

    /// Parse and process one input line.
    pub fn handle_line(&self, line: &str) -> Response {
        match serde_json::from_str::<RecommendRequest>(line) {
            Ok(request) => self.handle(&request),
            Err(e) => {
                warn!(error = %e, "unparsable request line");
                Response::Err(ErrorResponse::unparsable(format!("Unparsable request: {}", e)))
            }
        }
    }

    /// Serve until `reader` reaches EOF.
    pub async fn run<R, W>(&self, reader: R, mut writer: W) -> ServerResult<ServeStats>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = BufReader::new(reader).lines();
        let mut stats = ServeStats::default();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let response = self.handle_line(&line);
            match &response {
                Response::Ok(_) => stats.handled += 1,
                Response::Err(_) => stats.failed += 1,
            }

            let mut out = serde_json::to_string(&response)?;
            out.push('\n');
            writer.write_all(out.as_bytes()).await?;
            writer.flush().await?;
            debug!(handled = stats.handled, failed = stats.failed, "response written");
        }

        info!(handled = stats.handled, failed = stats.failed, "input closed");
        Ok(stats)
    }
}
