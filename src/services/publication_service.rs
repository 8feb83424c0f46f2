use tracing::{error, info, warn};

use crate::domain::{Batch, Channel, Episode};
use crate::errors::IngestError;
use crate::storage::traits::CatalogRepository;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub channels_published: usize,
    pub channels_failed: usize,
    /// Already carried a server id from an earlier run
    pub channels_skipped: usize,
    pub episodes_published: usize,
    pub episodes_failed: usize,
    pub summaries_published: usize,
    pub transcripts_published: usize,
    /// Summary or transcript posts that failed under a published episode
    pub children_failed: usize,
}

/// Publishes channels, then their episodes, then episode summaries and transcripts.
///
/// Each child is only posted once its parent holds a server id from this run.
/// Failures are logged and stop the failing record's descendants only.
pub struct PublicationService<'a, C: CatalogRepository> {
    catalog: &'a C,
}

impl<'a, C: CatalogRepository> PublicationService<'a, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self { catalog }
    }

    pub fn publish(&self, batch: &mut Batch) -> PublishReport {
        let mut report = PublishReport::default();

        for pod in batch.iter_mut() {
            info!(channel = %pod.channel.label(), "Posting channel");

            if pod.channel.is_published() {
                info!(
                    channel = %pod.channel.label(),
                    id = ?pod.channel.id(),
                    "Channel already published, skipping"
                );
                report.channels_skipped += 1;
                continue;
            }

            if !self.publish_channel(&mut pod.channel, &mut report) {
                continue;
            }

            for episode in pod.episodes.iter_mut() {
                self.publish_episode(&pod.channel, episode, &mut report);
            }
        }

        info!(
            channels_published = report.channels_published,
            channels_failed = report.channels_failed,
            channels_skipped = report.channels_skipped,
            episodes_published = report.episodes_published,
            episodes_failed = report.episodes_failed,
            summaries_published = report.summaries_published,
            transcripts_published = report.transcripts_published,
            children_failed = report.children_failed,
            "Publication finished"
        );
        report
    }

    fn publish_channel(&self, channel: &mut Channel, report: &mut PublishReport) -> bool {
        let payload = channel.to_payload();

        let id = match self.catalog.create_channel(&payload) {
            Ok(id) => id,
            Err(e) => {
                error!(
                    channel = %channel.label(),
                    payload = ?payload,
                    error = %e,
                    "Failed to create channel, skipping its episodes"
                );
                report.channels_failed += 1;
                return false;
            }
        };

        if let Err(e) = channel.assign_id(id) {
            error!(channel = %channel.label(), error = %e, "Could not record channel id");
            report.channels_failed += 1;
            return false;
        }

        info!(channel = %channel.label(), id, "Created channel");
        report.channels_published += 1;
        true
    }

    fn publish_episode(&self, channel: &Channel, episode: &mut Episode, report: &mut PublishReport) {
        let Some(channel_id) = channel.id() else {
            let e = IngestError::MissingParentId(channel.label());
            error!(episode = %episode.label(), error = %e, "Refusing to post episode");
            report.episodes_failed += 1;
            return;
        };

        if episode.is_published() {
            return;
        }

        let payload = episode.to_payload(channel_id);
        let id = match self.catalog.create_entry(&payload) {
            Ok(id) => id,
            Err(e) => {
                error!(
                    channel = %channel.label(),
                    episode = %episode.label(),
                    payload = ?payload,
                    error = %e,
                    "Failed to create episode, skipping its summary and transcript"
                );
                report.episodes_failed += 1;
                return;
            }
        };

        if let Err(e) = episode.assign_id(id) {
            error!(episode = %episode.label(), error = %e, "Could not record episode id");
            report.episodes_failed += 1;
            return;
        }
        report.episodes_published += 1;

        self.publish_children(episode, report);
    }

    fn publish_children(&self, episode: &Episode, report: &mut PublishReport) {
        let Some(entry_id) = episode.id() else {
            let e = IngestError::MissingParentId(episode.label());
            error!(error = %e, "Refusing to post summary or transcript");
            report.children_failed += 1;
            return;
        };

        match episode.generated_summary.as_ref().map(|s| s.to_payload(entry_id)) {
            Some(Some(payload)) => match self.catalog.create_summary(&payload) {
                Ok(_) => report.summaries_published += 1,
                Err(e) => {
                    error!(episode = %episode.label(), error = %e, "Failed to create summary");
                    report.children_failed += 1;
                }
            },
            Some(None) => {
                warn!(episode = %episode.label(), "Summary is incomplete, not posting it");
            }
            None => {}
        }

        if let Some(payload) = episode.transcript.as_ref().and_then(|t| t.to_payload(entry_id)) {
            match self.catalog.create_transcript(&payload) {
                Ok(_) => report.transcripts_published += 1,
                Err(e) => {
                    error!(episode = %episode.label(), error = %e, "Failed to create transcript");
                    report.children_failed += 1;
                }
            }
        }
    }
}
