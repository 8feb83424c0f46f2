use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid environment '{0}', expected DEV or PROD")]
    InvalidEnvironment(String),

    // Run-level failure: deduplication cannot proceed without the full catalog
    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),

    // Recoverable per-record failures
    #[error("Feed parsing failed for {url}: {reason}")]
    FeedParse { url: String, reason: String },

    #[error("Enrichment failed: {0}")]
    Enrichment(String),

    #[error("Publishing {record} failed (status {}): {detail}", display_status(.status))]
    Publish {
        record: &'static str,
        status: Option<u16>,
        detail: String,
    },

    #[error("Missing server id for parent {0}")]
    MissingParentId(String),

    // Network errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    // Checkpoint errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Checkpoint encoding failed: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("Checkpoint decoding failed: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("Server id already assigned to {0}")]
    IdAlreadyAssigned(String),
}

impl IngestError {
    pub fn feed_parse(url: &str, reason: impl ToString) -> Self {
        IngestError::FeedParse {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

fn display_status(status: &Option<u16>) -> String {
    status
        .map(|s| s.to_string())
        .unwrap_or_else(|| "none".to_string())
}

pub type IngestResult<T> = Result<T, IngestError>;
