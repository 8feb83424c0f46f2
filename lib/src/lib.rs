//! Catalog API bindings for Rust
//! Lists existing channels and creates channel, entry, summary and transcript records

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Unexpected status {status} from {url}: {body}")]
    UnexpectedStatus {
        url: String,
        status: u16,
        body: String,
    },
    #[error("Invalid response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

impl CatalogError {
    /// HTTP status of the failed call, when the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            CatalogError::UnexpectedStatus { status, .. } => Some(*status),
            CatalogError::RequestError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Catalog collections that accept POSTed records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Channels,
    Entries,
    Summaries,
    Transcripts,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Channels => "channels",
            Table::Entries => "entries",
            Table::Summaries => "summaries",
            Table::Transcripts => "transcripts",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn deserialize_string_or_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct StringOrI64Visitor;

    impl<'de> Visitor<'de> for StringOrI64Visitor {
        type Value = i64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or i64")
        }

        fn visit_i64<E>(self, v: i64) -> Result<i64, E> {
            Ok(v)
        }

        fn visit_u64<E>(self, v: u64) -> Result<i64, E>
        where
            E: de::Error,
        {
            i64::try_from(v).map_err(de::Error::custom)
        }

        fn visit_str<E>(self, v: &str) -> Result<i64, E>
        where
            E: de::Error,
        {
            v.parse().map_err(de::Error::custom)
        }
    }

    deserializer.deserialize_any(StringOrI64Visitor)
}

/// Limited view of a channel already present in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelRef {
    #[serde(deserialize_with = "deserialize_string_or_i64")]
    pub id: i64,
    pub rss_url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ChannelListing {
    Page {
        results: Vec<ChannelRef>,
        next: Option<String>,
    },
    Plain(Vec<ChannelRef>),
}

/// Body returned by every create endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Created {
    #[serde(deserialize_with = "deserialize_string_or_i64")]
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewChannel {
    pub author: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub subtitle: Option<String>,
    pub summary: Option<String>,
    pub title: Option<String>,
    pub updated_parsed: Option<String>,
    pub rss_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryLink {
    pub href: String,
    pub rel: Option<String>,
    #[serde(rename = "type")]
    pub media_type: Option<String>,
    pub length: Option<u64>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewEntry {
    pub channel: i64,
    pub author: Option<String>,
    /// Identifier of the item in the source feed, not the catalog id
    #[serde(rename = "_id")]
    pub source_id: Option<String>,
    pub itunes_duration: Option<String>,
    pub links: Vec<EntryLink>,
    pub published_parsed: Option<String>,
    #[serde(rename = "_summary")]
    pub summary: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewSummary {
    pub entry: i64,
    pub paragraph_summary: String,
    pub bullet_summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTranscript {
    pub entry: i64,
    pub transcript: String,
}

pub struct CatalogClient {
    base_url: String,
    secret: Option<String>,
    client: Client,
}

impl CatalogClient {
    pub fn new(
        base_url: &str,
        secret: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, CatalogError> {
        let base_url = base_url.trim_end_matches('/');
        if base_url.is_empty() {
            return Err(CatalogError::InvalidBaseUrl("empty".to_string()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            base_url: base_url.to_string(),
            secret: secret
                .map(|s| s.trim_matches('/').to_string())
                .filter(|s| !s.is_empty()),
            client,
        })
    }

    /// Collection URL, with the secret path segment when one is configured
    pub fn endpoint(&self, table: Table) -> String {
        match &self.secret {
            Some(secret) => format!("{}/{}/{}/", self.base_url, secret, table),
            None => format!("{}/{}/", self.base_url, table),
        }
    }

    /// Fetch every channel in the catalog, following pagination when the server uses it
    pub fn list_channels(&self) -> Result<Vec<ChannelRef>, CatalogError> {
        let mut channels = Vec::new();
        let mut visited = HashSet::new();
        let mut next = Some(format!("{}limited-fields/", self.endpoint(Table::Channels)));

        while let Some(url) = next.take() {
            visited.insert(url.clone());

            let response = self.client.get(&url).send()?;
            let status = response.status();
            let body = response.text()?;

            if status != StatusCode::OK {
                return Err(CatalogError::UnexpectedStatus {
                    url,
                    status: status.as_u16(),
                    body,
                });
            }

            let listing: ChannelListing =
                serde_json::from_str(&body).map_err(|e| CatalogError::InvalidResponse {
                    url: url.clone(),
                    reason: e.to_string(),
                })?;

            match listing {
                ChannelListing::Plain(page) => channels.extend(page),
                ChannelListing::Page {
                    results,
                    next: following,
                } => {
                    channels.extend(results);
                    // Pages linking back to an earlier page end the listing
                    next = following.filter(|n| !visited.contains(n));
                }
            }
        }

        Ok(channels)
    }

    pub fn create_channel(&self, payload: &NewChannel) -> Result<Created, CatalogError> {
        self.create(Table::Channels, payload)
    }

    pub fn create_entry(&self, payload: &NewEntry) -> Result<Created, CatalogError> {
        self.create(Table::Entries, payload)
    }

    pub fn create_summary(&self, payload: &NewSummary) -> Result<Created, CatalogError> {
        self.create(Table::Summaries, payload)
    }

    pub fn create_transcript(&self, payload: &NewTranscript) -> Result<Created, CatalogError> {
        self.create(Table::Transcripts, payload)
    }

    fn create<T: Serialize>(&self, table: Table, payload: &T) -> Result<Created, CatalogError> {
        let url = self.endpoint(table);
        let response = self.client.post(&url).json(payload).send()?;
        let status = response.status();
        let body = response.text()?;

        if status != StatusCode::CREATED {
            return Err(CatalogError::UnexpectedStatus {
                url,
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| CatalogError::InvalidResponse {
            url,
            reason: e.to_string(),
        })
    }
}
