use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::errors::{IngestError, IngestResult};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Which catalog deployment the run talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Prod,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => "DEV",
            Environment::Prod => "PROD",
        }
    }

    fn base_url_var(&self) -> &'static str {
        match self {
            Environment::Dev => "BASE_DEV_URL",
            Environment::Prod => "BASE_PROD_URL",
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DEV" => Ok(Environment::Dev),
            "PROD" => Ok(Environment::Prod),
            _ => Err(IngestError::InvalidEnvironment(s.to_string())),
        }
    }
}

/// Binary snapshot plus its human-readable twin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointPair {
    pub binary: PathBuf,
    pub structured: PathBuf,
}

impl CheckpointPair {
    pub fn new(binary: impl Into<PathBuf>, structured: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            structured: structured.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub base_url: String,
    pub url_secret: Option<String>,
    pub rss_urls: Option<Vec<String>>,
    /// Written after normalization
    pub new_entries: CheckpointPair,
    /// Written after enrichment and again after publication
    pub new_entries_with_summaries: CheckpointPair,
    pub request_timeout: Duration,
    /// Program and arguments split on whitespace, without shell quoting
    pub transcribe_command: Option<String>,
    /// Same form as `transcribe_command`
    pub summarize_command: Option<String>,
}

impl Config {
    /// Get the directory where the executable is located
    fn exe_dir() -> Option<PathBuf> {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    pub fn from_env() -> IngestResult<Self> {
        // Try to load .env from executable's directory first
        if let Some(dir) = Self::exe_dir() {
            let env_path = dir.join(".env");
            if env_path.exists() {
                dotenvy::from_path(&env_path).ok();
            }
        }
        // Fall back to current directory
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> IngestResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required =
            |key: &str| var(key).ok_or_else(|| IngestError::MissingEnvVar(key.to_string()));

        let environment: Environment = required("ENV")?.parse()?;

        let base_url = required(environment.base_url_var())?;
        Url::parse(&base_url).map_err(|e| {
            IngestError::Config(format!("{} is not a valid URL: {}", environment.base_url_var(), e))
        })?;

        // The literal "None" is accepted as an explicit "no secret"
        let url_secret = var("API_URL_SECRET_STRING").filter(|s| s != "None");

        let rss_urls = match var("RSS_URLS") {
            Some(raw) => Some(serde_json::from_str::<Vec<String>>(&raw).map_err(|e| {
                IngestError::Config(format!("RSS_URLS must be a JSON list of strings: {}", e))
            })?),
            None => None,
        };

        let path = |key: &str, default: &str| PathBuf::from(var(key).unwrap_or_else(|| default.to_string()));

        let new_entries = CheckpointPair {
            binary: path("NEW_ENTRIES_BIN", "data/new_entries.bin"),
            structured: path("NEW_ENTRIES_JSON", "data/new_entries.json"),
        };
        let new_entries_with_summaries = CheckpointPair {
            binary: path(
                "NEW_ENTRIES_WITH_SUMMARIES_BIN",
                "data/new_entries_with_summaries.bin",
            ),
            structured: path(
                "NEW_ENTRIES_WITH_SUMMARIES_JSON",
                "data/new_entries_with_summaries.json",
            ),
        };

        let request_timeout = match var("REQUEST_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    IngestError::Config(format!("REQUEST_TIMEOUT_SECS must be a number, got '{}'", raw))
                })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            environment,
            base_url,
            url_secret,
            rss_urls,
            new_entries,
            new_entries_with_summaries,
            request_timeout,
            transcribe_command: var("TRANSCRIBE_COMMAND"),
            summarize_command: var("SUMMARIZE_COMMAND"),
        })
    }

    /// Candidate feed URLs, required by the commands that start from scratch
    pub fn candidate_urls(&self) -> IngestResult<Vec<String>> {
        self.rss_urls
            .clone()
            .ok_or_else(|| IngestError::MissingEnvVar("RSS_URLS".to_string()))
    }
}
