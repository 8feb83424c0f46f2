use std::time::Duration;

use chrono::{DateTime, Utc};
use feed_rs::model::{Entry, Feed, Text};
use feed_rs::parser;
use tracing::{error, info, warn};

use crate::domain::{Batch, Channel, Episode, EpisodeLink, Pod};
use crate::errors::{IngestError, IngestResult};
use crate::sources::traits::FeedFetcher;

/// Turns feed URLs into channel/episode records
pub struct FeedNormalizer<F: FeedFetcher> {
    fetcher: F,
}

impl<F: FeedFetcher> FeedNormalizer<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    /// Fetch and normalize one feed.
    ///
    /// Transport and parse failures are logged and reported as `None`, so one
    /// bad feed never stops the rest of a batch.
    pub fn normalize(&self, url: &str) -> Option<Pod> {
        match self.try_normalize(url) {
            Ok(pod) => Some(pod),
            Err(e) => {
                error!(url, error = %e, "Failed to parse feed");
                None
            }
        }
    }

    /// Normalize every URL in order, keeping only the feeds that parsed
    pub fn normalize_all(&self, urls: &[String]) -> Batch {
        let total = urls.len();

        urls.iter()
            .enumerate()
            .filter_map(|(i, url)| {
                info!("Parsing url {} of {} total", i + 1, total);
                self.normalize(url)
            })
            .collect()
    }

    fn try_normalize(&self, url: &str) -> IngestResult<Pod> {
        let bytes = self.fetcher.fetch(url)?;
        parse_feed(url, &bytes)
    }
}

/// Parse a feed document into its channel and newest episode
pub fn parse_feed(url: &str, bytes: &[u8]) -> IngestResult<Pod> {
    let feed = parser::parse(bytes).map_err(|e| IngestError::feed_parse(url, e))?;

    let channel = channel_from_feed(url, &feed);

    let newest = newest_entry(&feed.entries)
        .ok_or_else(|| IngestError::feed_parse(url, "feed has no entries"))?;
    let episode = episode_from_entry(url, newest);

    for field in channel.missing_fields() {
        warn!(channel = %channel.label(), field, "Channel has no value for field");
    }
    for field in episode.missing_fields() {
        warn!(
            channel = %channel.label(),
            episode = %episode.label(),
            field,
            "Episode has no value for field"
        );
    }

    Ok(Pod::new(channel, vec![episode]))
}

fn channel_from_feed(url: &str, feed: &Feed) -> Channel {
    let description = text(feed.description.as_ref());

    let mut channel = Channel::new(url);
    channel.author = feed.authors.first().and_then(|p| non_empty(&p.name));
    channel.category = feed.categories.first().and_then(|c| non_empty(&c.term));
    channel.image = feed
        .logo
        .as_ref()
        .or(feed.icon.as_ref())
        .and_then(|i| non_empty(&i.uri));
    // Feed parsers alias subtitle and summary to the description for RSS
    channel.subtitle = description.clone();
    channel.summary = description.clone();
    channel.description = description;
    channel.title = text(feed.title.as_ref());
    channel.updated = feed.updated.map(to_iso8601);
    channel
}

fn episode_from_entry(channel_url: &str, entry: &Entry) -> Episode {
    let mut episode = Episode::new(channel_url);
    episode.author = entry.authors.first().and_then(|p| non_empty(&p.name));
    episode.source_id = non_empty(&entry.id);
    episode.duration = entry
        .media
        .iter()
        .find_map(|m| m.duration.or_else(|| m.content.iter().find_map(|c| c.duration)))
        .map(format_duration);
    episode.links = entry_links(entry);
    episode.published = entry.published.or(entry.updated).map(to_iso8601);
    episode.summary = text(entry.summary.as_ref());
    episode.title = text(entry.title.as_ref());
    episode
}

fn entry_links(entry: &Entry) -> Vec<EpisodeLink> {
    let mut links: Vec<EpisodeLink> = entry
        .links
        .iter()
        .filter(|l| !l.href.trim().is_empty())
        .map(|l| EpisodeLink {
            href: l.href.clone(),
            rel: l.rel.clone(),
            media_type: l.media_type.clone(),
            length: l.length,
            title: l.title.clone(),
        })
        .collect();

    let enclosures = entry
        .media
        .iter()
        .flat_map(|m| m.content.iter())
        .filter_map(|c| {
            c.url.as_ref().map(|u| EpisodeLink {
                href: u.to_string(),
                rel: Some("enclosure".to_string()),
                media_type: c.content_type.as_ref().map(|m| m.to_string()),
                length: c.size,
                title: None,
            })
        });

    for enclosure in enclosures {
        if !links.iter().any(|l| l.href == enclosure.href) {
            links.push(enclosure);
        }
    }

    links
}

/// Entry with the latest timestamp; undated entries lose, ties keep document order
fn newest_entry(entries: &[Entry]) -> Option<&Entry> {
    entries.iter().fold(None, |best: Option<&Entry>, entry| match best {
        Some(current) if entry_time(entry) <= entry_time(current) => Some(current),
        _ => Some(entry),
    })
}

fn entry_time(entry: &Entry) -> Option<DateTime<Utc>> {
    entry.published.or(entry.updated)
}

fn text(value: Option<&Text>) -> Option<String> {
    value.and_then(|t| non_empty(&t.content))
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub fn to_iso8601(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S").to_string()
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}
