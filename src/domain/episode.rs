use catalog_api::{EntryLink, NewEntry};
use serde::{Deserialize, Serialize};

use super::{Summary, Transcript};
use crate::errors::{IngestError, IngestResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeLink {
    pub href: String,
    pub rel: Option<String>,
    pub media_type: Option<String>,
    pub length: Option<u64>,
    pub title: Option<String>,
}

impl EpisodeLink {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            rel: None,
            media_type: None,
            length: None,
            title: None,
        }
    }

    fn to_payload(&self) -> EntryLink {
        EntryLink {
            href: self.href.clone(),
            rel: self.rel.clone(),
            media_type: self.media_type.clone(),
            length: self.length,
            title: self.title.clone(),
        }
    }
}

/// Newest entry of a channel at parse time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub author: Option<String>,
    /// Identifier from the source feed, distinct from the catalog id
    pub source_id: Option<String>,
    pub duration: Option<String>,
    pub links: Vec<EpisodeLink>,
    /// ISO-8601, UTC without offset
    pub published: Option<String>,
    /// Raw summary text from the feed
    pub summary: Option<String>,
    pub title: Option<String>,
    /// rss_url of the owning channel
    pub channel_url: String,
    pub transcript: Option<Transcript>,
    pub generated_summary: Option<Summary>,
    id: Option<i64>,
}

impl Episode {
    pub fn new(channel_url: impl Into<String>) -> Self {
        Self {
            author: None,
            source_id: None,
            duration: None,
            links: Vec::new(),
            published: None,
            summary: None,
            title: None,
            channel_url: channel_url.into(),
            transcript: None,
            generated_summary: None,
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

    pub fn assign_id(&mut self, id: i64) -> IngestResult<()> {
        if self.id.is_some() {
            return Err(IngestError::IdAlreadyAssigned(self.label()));
        }
        self.id = Some(id);
        Ok(())
    }

    pub fn label(&self) -> String {
        self.title
            .clone()
            .or_else(|| self.source_id.clone())
            .unwrap_or_else(|| format!("untitled episode of {}", self.channel_url))
    }

    /// Attach a generated summary. Incomplete summaries are refused.
    pub fn attach_summary(&mut self, summary: Summary) -> bool {
        if !summary.is_complete() {
            return false;
        }
        self.generated_summary = Some(summary);
        true
    }

    pub fn attach_transcript(&mut self, transcript: Transcript) {
        self.transcript = Some(transcript);
    }

    pub fn is_enriched(&self) -> bool {
        self.generated_summary.is_some() || self.transcript.as_ref().is_some_and(|t| !t.is_empty())
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("author", self.author.is_none()),
            ("id", self.source_id.is_none()),
            ("duration", self.duration.is_none()),
            ("links", self.links.is_empty()),
            ("published", self.published.is_none()),
            ("summary", self.summary.is_none()),
            ("title", self.title.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, missing)| missing.then_some(name))
        .collect()
    }

    /// Catalog payload keyed to the parent channel's server id
    pub fn to_payload(&self, channel_id: i64) -> NewEntry {
        NewEntry {
            channel: channel_id,
            author: self.author.clone(),
            source_id: self.source_id.clone(),
            itunes_duration: self.duration.clone(),
            links: self.links.iter().map(EpisodeLink::to_payload).collect(),
            published_parsed: self.published.clone(),
            summary: self.summary.clone(),
            title: self.title.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_summary_refuses_incomplete() {
        let mut episode = Episode::new("https://b.fm/rss");

        assert!(!episode.attach_summary(Summary::new("para", "")));
        assert!(episode.generated_summary.is_none());
        assert!(!episode.is_enriched());

        assert!(episode.attach_summary(Summary::new("para", "- one")));
        assert!(episode.is_enriched());
    }

    #[test]
    fn test_empty_transcript_is_not_enrichment() {
        let mut episode = Episode::new("https://b.fm/rss");
        episode.attach_transcript(Transcript::default());
        assert!(!episode.is_enriched());
    }

    #[test]
    fn test_payload_carries_parent_id() {
        let mut episode = Episode::new("https://b.fm/rss").with_title("Pilot");
        episode.source_id = Some("guid-1".to_string());
        episode.links.push(EpisodeLink::new("https://b.fm/pilot"));

        let payload = episode.to_payload(42);

        assert_eq!(payload.channel, 42);
        assert_eq!(payload.source_id.as_deref(), Some("guid-1"));
        assert_eq!(payload.links.len(), 1);
        assert_eq!(payload.title.as_deref(), Some("Pilot"));
    }

    #[test]
    fn test_label_falls_back_to_source_id() {
        let mut episode = Episode::new("https://b.fm/rss");
        episode.source_id = Some("guid-1".to_string());
        assert_eq!(episode.label(), "guid-1");
    }
}
