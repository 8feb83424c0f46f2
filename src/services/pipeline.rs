use std::fmt;

use tracing::{debug, error, info, warn};

use crate::config::{CheckpointPair, Config};
use crate::domain::Batch;
use crate::errors::IngestResult;
use crate::generators::traits::{SummaryGenerator, TranscriptGenerator};
use crate::services::dedup_service::DedupService;
use crate::services::enrichment_service::EnrichmentService;
use crate::services::publication_service::{PublicationService, PublishReport};
use crate::sources::normalizer::FeedNormalizer;
use crate::sources::traits::FeedFetcher;
use crate::storage::traits::{BatchStore, CatalogRepository};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Dedupe,
    Normalize,
    CheckpointRaw,
    Enrich,
    CheckpointEnriched,
    Publish,
    Done,
    Empty,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Dedupe => "dedupe",
            Stage::Normalize => "normalize",
            Stage::CheckpointRaw => "checkpoint-raw",
            Stage::Enrich => "enrich",
            Stage::CheckpointEnriched => "checkpoint-enriched",
            Stage::Publish => "publish",
            Stage::Done => "done",
            Stage::Empty => "empty",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The named stage left nothing to carry forward
    NothingToDo(Stage),
    Published(PublishReport),
}

/// Where the two checkpoint pairs live
#[derive(Debug, Clone)]
pub struct Checkpoints {
    /// After normalization
    pub raw: CheckpointPair,
    /// After enrichment, rewritten after publication
    pub enriched: CheckpointPair,
}

impl Checkpoints {
    pub fn from_config(config: &Config) -> Self {
        Self {
            raw: config.new_entries.clone(),
            enriched: config.new_entries_with_summaries.clone(),
        }
    }
}

enum Step {
    Dedupe(Vec<String>),
    Normalize(Vec<String>),
    CheckpointRaw(Batch),
    Enrich(Batch),
    CheckpointEnriched(Batch),
    Publish(Batch),
    Done(PublishReport),
    Empty(Stage),
}

impl Step {
    fn stage(&self) -> Stage {
        match self {
            Step::Dedupe(_) => Stage::Dedupe,
            Step::Normalize(_) => Stage::Normalize,
            Step::CheckpointRaw(_) => Stage::CheckpointRaw,
            Step::Enrich(_) => Stage::Enrich,
            Step::CheckpointEnriched(_) => Stage::CheckpointEnriched,
            Step::Publish(_) => Stage::Publish,
            Step::Done(_) => Stage::Done,
            Step::Empty(_) => Stage::Empty,
        }
    }
}

/// Sequences dedupe, normalize, enrich and publish with checkpoints in between.
///
/// Strictly sequential. A failing stage halts the run; the last checkpoint
/// written stays the resumption point.
pub struct Pipeline<'a, C, F, S, T, G>
where
    C: CatalogRepository,
    F: FeedFetcher,
    S: BatchStore,
    T: TranscriptGenerator,
    G: SummaryGenerator,
{
    catalog: &'a C,
    normalizer: FeedNormalizer<F>,
    store: S,
    enrichment: Option<EnrichmentService<T, G>>,
    checkpoints: Checkpoints,
}

impl<'a, C, F, S, T, G> Pipeline<'a, C, F, S, T, G>
where
    C: CatalogRepository,
    F: FeedFetcher,
    S: BatchStore,
    T: TranscriptGenerator,
    G: SummaryGenerator,
{
    pub fn new(
        catalog: &'a C,
        normalizer: FeedNormalizer<F>,
        store: S,
        enrichment: Option<EnrichmentService<T, G>>,
        checkpoints: Checkpoints,
    ) -> Self {
        Self {
            catalog,
            normalizer,
            store,
            enrichment,
            checkpoints,
        }
    }

    /// Full run over candidate feed URLs
    pub fn run(&self, urls: Vec<String>) -> IngestResult<RunOutcome> {
        info!(candidates = urls.len(), "Starting ingestion run");
        self.drive(Step::Dedupe(urls))
    }

    /// Pick up from the post-normalization checkpoint
    pub fn resume_enrich(&self) -> IngestResult<RunOutcome> {
        let batch = self.store.load(&self.checkpoints.raw)?;
        self.drive(Step::Enrich(batch))
    }

    /// Pick up from the post-enrichment checkpoint
    pub fn resume_publish(&self) -> IngestResult<RunOutcome> {
        let batch = self.store.load(&self.checkpoints.enriched)?;
        self.drive(Step::Publish(batch))
    }

    fn drive(&self, mut step: Step) -> IngestResult<RunOutcome> {
        loop {
            debug!(stage = %step.stage(), "Entering stage");

            step = match step {
                Step::Dedupe(urls) => {
                    let remaining = DedupService::new(self.catalog).remove_existing(&urls)?;
                    if remaining.is_empty() {
                        warn!("No new RSS URLs to process, every candidate already exists as a channel");
                        Step::Empty(Stage::Dedupe)
                    } else {
                        Step::Normalize(remaining)
                    }
                }
                Step::Normalize(urls) => {
                    let batch = self.normalizer.normalize_all(&urls);
                    if batch.is_empty() {
                        warn!("No new channels and entries were successfully parsed");
                        Step::Empty(Stage::Normalize)
                    } else {
                        info!(channels = batch.len(), episodes = batch.episode_count(), "New entries found");
                        Step::CheckpointRaw(batch)
                    }
                }
                Step::CheckpointRaw(batch) => {
                    self.store.save(&batch, &self.checkpoints.raw)?;
                    Step::Enrich(batch)
                }
                Step::Enrich(mut batch) => {
                    if batch.is_empty() {
                        warn!("Checkpoint holds no channels to enrich");
                        Step::Empty(Stage::Enrich)
                    } else {
                        match &self.enrichment {
                            Some(service) => {
                                service.enrich(&mut batch);
                            }
                            None => warn!("No generators configured, episodes carry no transcript or summary"),
                        }
                        Step::CheckpointEnriched(batch)
                    }
                }
                Step::CheckpointEnriched(batch) => {
                    self.store.save(&batch, &self.checkpoints.enriched)?;
                    Step::Publish(batch)
                }
                Step::Publish(mut batch) => {
                    if batch.pending_channels() == 0 {
                        warn!("Every channel in the batch is already published");
                        Step::Empty(Stage::Publish)
                    } else {
                        let report = PublicationService::new(self.catalog).publish(&mut batch);
                        // Server ids obtained above exist only in memory until this lands
                        if let Err(e) = self.store.save(&batch, &self.checkpoints.enriched) {
                            error!(
                                error = %e,
                                channels_published = report.channels_published,
                                "Could not checkpoint publication results"
                            );
                            return Err(e);
                        }
                        Step::Done(report)
                    }
                }
                Step::Done(report) => {
                    info!("Ingestion run completed");
                    return Ok(RunOutcome::Published(report));
                }
                Step::Empty(stage) => {
                    info!(after = %stage, "Nothing to do");
                    return Ok(RunOutcome::NothingToDo(stage));
                }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Channel, Episode, Pod, Summary};
    use crate::errors::IngestError;
    use crate::generators::traits::{MockSummaryGenerator, MockTranscriptGenerator};
    use crate::sources::traits::MockFeedFetcher;
    use crate::storage::checkpoint::FileBatchStore;
    use crate::storage::traits::{MockBatchStore, MockCatalogRepository};
    use catalog_api::ChannelRef;
    use tempfile::TempDir;

    type Generators = EnrichmentService<MockTranscriptGenerator, MockSummaryGenerator>;

    const FEED_B: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>B</title>
    <link>https://b.fm/</link>
    <description>The B show</description>
    <item>
      <title>B pilot</title>
      <link>https://b.fm/1</link>
      <guid>b-1</guid>
      <pubDate>Wed, 10 Jan 2024 08:00:00 +0000</pubDate>
    </item>
  </channel>
</rss>"#;

    fn checkpoints(dir: &TempDir) -> Checkpoints {
        Checkpoints {
            raw: CheckpointPair::new(dir.path().join("raw.bin"), dir.path().join("raw.json")),
            enriched: CheckpointPair::new(
                dir.path().join("enriched.bin"),
                dir.path().join("enriched.json"),
            ),
        }
    }

    fn unused_checkpoints() -> Checkpoints {
        Checkpoints {
            raw: CheckpointPair::new("unused-raw.bin", "unused-raw.json"),
            enriched: CheckpointPair::new("unused-enriched.bin", "unused-enriched.json"),
        }
    }

    fn existing(urls: &'static [&'static str]) -> MockCatalogRepository {
        let mut catalog = MockCatalogRepository::new();
        catalog.expect_existing_channels().times(1).returning(move || {
            Ok(urls
                .iter()
                .enumerate()
                .map(|(i, u)| ChannelRef {
                    id: i as i64 + 1,
                    rss_url: Some(u.to_string()),
                    title: None,
                })
                .collect())
        });
        catalog
    }

    fn generators() -> Generators {
        let mut transcriber = MockTranscriptGenerator::new();
        transcriber
            .expect_transcribe()
            .returning(|_, _| Ok("transcript".to_string()));
        let mut summarizer = MockSummaryGenerator::new();
        summarizer
            .expect_summarize()
            .returning(|_, _, _| Ok(Summary::new("para", "- bullet")));
        EnrichmentService::new(transcriber, summarizer)
    }

    fn urls(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_nothing_after_dedupe_stops_early() {
        let catalog = existing(&["https://a.fm/rss"]);
        let mut fetcher = MockFeedFetcher::new();
        fetcher.expect_fetch().never();
        let mut store = MockBatchStore::new();
        store.expect_save().never();
        let mut transcriber = MockTranscriptGenerator::new();
        transcriber.expect_transcribe().never();
        let mut summarizer = MockSummaryGenerator::new();
        summarizer.expect_summarize().never();

        let pipeline = Pipeline::new(
            &catalog,
            FeedNormalizer::new(fetcher),
            store,
            Some(EnrichmentService::new(transcriber, summarizer)),
            unused_checkpoints(),
        );

        let outcome = pipeline.run(urls(&["https://a.fm/rss"])).unwrap();

        assert_eq!(outcome, RunOutcome::NothingToDo(Stage::Dedupe));
    }

    #[test]
    fn test_nothing_parsed_stops_before_checkpoint() {
        let mut catalog = existing(&[]);
        catalog.expect_create_channel().never();
        let mut fetcher = MockFeedFetcher::new();
        fetcher
            .expect_fetch()
            .times(2)
            .returning(|_| Ok(b"<html>maintenance</html>".to_vec()));
        let mut store = MockBatchStore::new();
        store.expect_save().never();

        let pipeline = Pipeline::new(
            &catalog,
            FeedNormalizer::new(fetcher),
            store,
            None::<Generators>,
            unused_checkpoints(),
        );

        let outcome = pipeline
            .run(urls(&["https://x.fm/rss", "https://y.fm/rss"]))
            .unwrap();

        assert_eq!(outcome, RunOutcome::NothingToDo(Stage::Normalize));
    }

    #[test]
    fn test_catalog_unavailable_aborts_run() {
        let mut catalog = MockCatalogRepository::new();
        catalog
            .expect_existing_channels()
            .returning(|| Err(IngestError::CatalogUnavailable("connection refused".to_string())));
        let mut fetcher = MockFeedFetcher::new();
        fetcher.expect_fetch().never();
        let mut store = MockBatchStore::new();
        store.expect_save().never();

        let pipeline = Pipeline::new(
            &catalog,
            FeedNormalizer::new(fetcher),
            store,
            None::<Generators>,
            unused_checkpoints(),
        );

        let result = pipeline.run(urls(&["https://b.fm/rss"]));

        assert!(matches!(result, Err(IngestError::CatalogUnavailable(_))));
    }

    #[test]
    fn test_full_run_publishes_and_checkpoints() {
        let dir = TempDir::new().unwrap();
        let mut catalog = existing(&["https://a.fm/rss"]);
        catalog
            .expect_create_channel()
            .withf(|p| p.rss_url == "https://b.fm/rss")
            .times(1)
            .returning(|_| Ok(42));
        catalog
            .expect_create_entry()
            .withf(|p| p.channel == 42 && p.source_id.as_deref() == Some("b-1"))
            .times(1)
            .returning(|_| Ok(7));
        catalog
            .expect_create_summary()
            .withf(|p| p.entry == 7)
            .times(1)
            .returning(|_| Ok(1));
        catalog
            .expect_create_transcript()
            .withf(|p| p.entry == 7)
            .times(1)
            .returning(|_| Ok(1));

        let mut fetcher = MockFeedFetcher::new();
        fetcher
            .expect_fetch()
            .withf(|url| url == "https://b.fm/rss")
            .times(1)
            .returning(|_| Ok(FEED_B.to_vec()));

        let pipeline = Pipeline::new(
            &catalog,
            FeedNormalizer::new(fetcher),
            FileBatchStore::new(),
            Some(generators()),
            checkpoints(&dir),
        );

        let outcome = pipeline
            .run(urls(&["https://a.fm/rss", "https://b.fm/rss"]))
            .unwrap();

        match outcome {
            RunOutcome::Published(report) => {
                assert_eq!(report.channels_published, 1);
                assert_eq!(report.episodes_published, 1);
                assert_eq!(report.summaries_published, 1);
                assert_eq!(report.transcripts_published, 1);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        let store = FileBatchStore::new();
        let raw = store.load(&checkpoints(&dir).raw).unwrap();
        let raw_pod = raw.iter().next().unwrap();
        assert_eq!(raw_pod.channel.id(), None);
        assert!(raw_pod.episodes[0].transcript.is_none());

        let published = store.load(&checkpoints(&dir).enriched).unwrap();
        let pod = published.iter().next().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(pod.channel.id(), Some(42));
        assert_eq!(pod.episodes[0].id(), Some(7));
        assert!(pod.episodes[0].generated_summary.is_some());
    }

    #[test]
    fn test_repeated_url_creates_one_channel() {
        let dir = TempDir::new().unwrap();
        let mut catalog = existing(&[]);
        catalog
            .expect_create_channel()
            .withf(|p| p.rss_url == "https://b.fm/rss")
            .times(1)
            .returning(|_| Ok(42));
        catalog.expect_create_entry().times(1).returning(|_| Ok(7));

        let mut fetcher = MockFeedFetcher::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(|_| Ok(FEED_B.to_vec()));

        let pipeline = Pipeline::new(
            &catalog,
            FeedNormalizer::new(fetcher),
            FileBatchStore::new(),
            None::<Generators>,
            checkpoints(&dir),
        );

        let outcome = pipeline
            .run(urls(&["https://b.fm/rss", "https://b.fm/rss"]))
            .unwrap();

        assert!(matches!(outcome, RunOutcome::Published(ref r) if r.channels_published == 1));
        let saved = FileBatchStore::new().load(&checkpoints(&dir).enriched).unwrap();
        assert_eq!(saved.len(), 1);
    }

    #[test]
    fn test_resume_publish_skips_published_channels() {
        let dir = TempDir::new().unwrap();
        let store = FileBatchStore::new();

        let mut done = Channel::new("https://a.fm/rss").with_title("A");
        done.assign_id(1).unwrap();
        let pending = Channel::new("https://b.fm/rss").with_title("B");
        let batch: Batch = vec![
            Pod::new(done, vec![Episode::new("https://a.fm/rss")]),
            Pod::new(pending, vec![Episode::new("https://b.fm/rss")]),
        ]
        .into();
        store.save(&batch, &checkpoints(&dir).enriched).unwrap();

        let mut catalog = MockCatalogRepository::new();
        catalog
            .expect_create_channel()
            .withf(|p| p.rss_url == "https://b.fm/rss")
            .times(1)
            .returning(|_| Ok(2));
        catalog
            .expect_create_entry()
            .withf(|p| p.channel == 2)
            .times(1)
            .returning(|_| Ok(20));

        let pipeline = Pipeline::new(
            &catalog,
            FeedNormalizer::new(MockFeedFetcher::new()),
            FileBatchStore::new(),
            None::<Generators>,
            checkpoints(&dir),
        );

        let outcome = pipeline.resume_publish().unwrap();

        assert!(matches!(outcome, RunOutcome::Published(ref r) if r.channels_skipped == 1));
        let saved = store.load(&checkpoints(&dir).enriched).unwrap();
        assert_eq!(saved.pending_channels(), 0);
    }

    #[test]
    fn test_resume_publish_with_nothing_pending() {
        let dir = TempDir::new().unwrap();
        let mut done = Channel::new("https://a.fm/rss");
        done.assign_id(1).unwrap();
        FileBatchStore::new()
            .save(&vec![Pod::new(done, vec![])].into(), &checkpoints(&dir).enriched)
            .unwrap();

        let mut catalog = MockCatalogRepository::new();
        catalog.expect_create_channel().never();

        let pipeline = Pipeline::new(
            &catalog,
            FeedNormalizer::new(MockFeedFetcher::new()),
            FileBatchStore::new(),
            None::<Generators>,
            checkpoints(&dir),
        );

        assert_eq!(
            pipeline.resume_publish().unwrap(),
            RunOutcome::NothingToDo(Stage::Publish)
        );
    }

    #[test]
    fn test_failed_checkpoint_halts_before_publication() {
        let mut catalog = existing(&[]);
        catalog.expect_create_channel().never();
        let mut fetcher = MockFeedFetcher::new();
        fetcher.expect_fetch().returning(|_| Ok(FEED_B.to_vec()));
        let mut store = MockBatchStore::new();
        store.expect_save().times(1).returning(|_, _| {
            Err(IngestError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only filesystem",
            )))
        });

        let pipeline = Pipeline::new(
            &catalog,
            FeedNormalizer::new(fetcher),
            store,
            None::<Generators>,
            unused_checkpoints(),
        );

        assert!(matches!(
            pipeline.run(urls(&["https://b.fm/rss"])),
            Err(IngestError::Io(_))
        ));
    }
}
