use catalog_api::NewChannel;
use serde::{Deserialize, Serialize};

use crate::errors::{IngestError, IngestResult};

/// A podcast feed as it will be recorded in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub author: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub subtitle: Option<String>,
    pub summary: Option<String>,
    pub title: Option<String>,
    /// ISO-8601, UTC without offset
    pub updated: Option<String>,
    /// Natural key until the catalog assigns an id
    pub rss_url: String,
    id: Option<i64>,
}

impl Channel {
    pub fn new(rss_url: impl Into<String>) -> Self {
        Self {
            author: None,
            category: None,
            description: None,
            image: None,
            subtitle: None,
            summary: None,
            title: None,
            updated: None,
            rss_url: rss_url.into(),
            id: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn is_published(&self) -> bool {
        self.id.is_some()
    }

    /// Record the server-assigned id. An id is never overwritten.
    pub fn assign_id(&mut self, id: i64) -> IngestResult<()> {
        if self.id.is_some() {
            return Err(IngestError::IdAlreadyAssigned(self.label()));
        }
        self.id = Some(id);
        Ok(())
    }

    /// Title when known, feed URL otherwise
    pub fn label(&self) -> String {
        match &self.title {
            Some(title) => format!("'{}' ({})", title, self.rss_url),
            None => self.rss_url.clone(),
        }
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("author", self.author.is_none()),
            ("category", self.category.is_none()),
            ("description", self.description.is_none()),
            ("image", self.image.is_none()),
            ("subtitle", self.subtitle.is_none()),
            ("summary", self.summary.is_none()),
            ("title", self.title.is_none()),
            ("updated", self.updated.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, missing)| missing.then_some(name))
        .collect()
    }

    pub fn to_payload(&self) -> NewChannel {
        NewChannel {
            author: self.author.clone(),
            category: self.category.clone(),
            description: self.description.clone(),
            image: self.image.clone(),
            subtitle: self.subtitle.clone(),
            summary: self.summary.clone(),
            title: self.title.clone(),
            updated_parsed: self.updated.clone(),
            rss_url: self.rss_url.clone(),
        }
    }
}
