use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Parser;

use podsum_ingest::cli::{Cli, Commands};
use podsum_ingest::config::{CheckpointPair, Config};
use podsum_ingest::domain::Batch;
use podsum_ingest::generators::CommandGenerator;
use podsum_ingest::services::{
    Checkpoints, DedupService, EnrichmentService, Pipeline, PublishReport, RunOutcome, Stage,
};
use podsum_ingest::sources::{FeedNormalizer, HttpFeedFetcher};
use podsum_ingest::storage::{ApiCatalogRepository, BatchStore, FileBatchStore};

type Enrichment = EnrichmentService<CommandGenerator, CommandGenerator>;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Inspecting a checkpoint needs no catalog
    if let Commands::Inspect { path } = &cli.command {
        return cmd_inspect(path);
    }

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!(
        environment = config.environment.as_str(),
        base_url = %config.base_url,
        "Configuration loaded"
    );

    let catalog = ApiCatalogRepository::from_config(&config)?;

    match cli.command {
        Commands::Dedupe => cmd_dedupe(&catalog, &config),
        Commands::Run => {
            let urls = config.candidate_urls()?;
            let outcome = pipeline(&catalog, &config)?.run(urls)?;
            report(outcome);
            Ok(())
        }
        Commands::Enrich => {
            let outcome = pipeline(&catalog, &config)?
                .resume_enrich()
                .with_context(|| resume_hint(&config.new_entries))?;
            report(outcome);
            Ok(())
        }
        Commands::Publish => {
            let outcome = pipeline(&catalog, &config)?
                .resume_publish()
                .with_context(|| resume_hint(&config.new_entries_with_summaries))?;
            report(outcome);
            Ok(())
        }
        Commands::Inspect { .. } => Ok(()),
    }
}

fn pipeline<'a>(
    catalog: &'a ApiCatalogRepository,
    config: &Config,
) -> Result<Pipeline<'a, ApiCatalogRepository, HttpFeedFetcher, FileBatchStore, CommandGenerator, CommandGenerator>>
{
    let fetcher = HttpFeedFetcher::new(config.request_timeout)?;

    Ok(Pipeline::new(
        catalog,
        FeedNormalizer::new(fetcher),
        FileBatchStore::new(),
        enrichment(config)?,
        Checkpoints::from_config(config),
    ))
}

fn enrichment(config: &Config) -> Result<Option<Enrichment>> {
    match (&config.transcribe_command, &config.summarize_command) {
        (Some(transcribe), Some(summarize)) => Ok(Some(EnrichmentService::new(
            CommandGenerator::parse(transcribe)?,
            CommandGenerator::parse(summarize)?,
        ))),
        (None, None) => Ok(None),
        _ => bail!("TRANSCRIBE_COMMAND and SUMMARIZE_COMMAND must be set together"),
    }
}

fn resume_hint(pair: &CheckpointPair) -> String {
    format!("Could not resume from checkpoint {}", pair.binary.display())
}

fn cmd_dedupe(catalog: &ApiCatalogRepository, config: &Config) -> Result<()> {
    let urls = config.candidate_urls()?;
    let remaining = DedupService::new(catalog).remove_existing(&urls)?;

    if remaining.is_empty() {
        println!("No new RSS URLs to process.");
        return Ok(());
    }

    println!("{} of {} URLs are new:\n", remaining.len(), urls.len());
    for url in &remaining {
        println!("  {}", url);
    }

    Ok(())
}

fn cmd_inspect(path: &Path) -> Result<()> {
    let pair = CheckpointPair::new(path, path.with_extension("json"));
    let batch = FileBatchStore::new()
        .load(&pair)
        .with_context(|| format!("Could not read checkpoint {}", path.display()))?;

    print_batch(&batch);
    Ok(())
}

fn print_batch(batch: &Batch) {
    if batch.is_empty() {
        println!("Checkpoint is empty.");
        return;
    }

    println!(
        "{} channels, {} episodes ({} pending):\n",
        batch.len(),
        batch.episode_count(),
        batch.pending_channels()
    );

    for pod in batch.iter() {
        let channel = &pod.channel;
        let id = channel
            .id()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "pending".to_string());
        let enriched = pod.episodes.iter().filter(|e| e.is_enriched()).count();

        println!("  {} [{}]", channel.title.as_deref().unwrap_or("(untitled)"), id);
        println!("    URL: {}", channel.rss_url);
        println!(
            "    Episodes: {} ({} enriched)",
            pod.episodes.len(),
            enriched
        );
        println!();
    }
}

fn report(outcome: RunOutcome) {
    match outcome {
        RunOutcome::NothingToDo(Stage::Dedupe) => {
            println!("No new RSS URLs to process, nothing to do.")
        }
        RunOutcome::NothingToDo(Stage::Normalize) => {
            println!("No new channels and entries were successfully parsed, nothing to do.")
        }
        RunOutcome::NothingToDo(stage) => {
            println!("Nothing to do after the {} stage.", stage)
        }
        RunOutcome::Published(summary) => print_report(&summary),
    }
}

fn print_report(report: &PublishReport) {
    println!(
        "Published {} channels ({} failed, {} already published).",
        report.channels_published, report.channels_failed, report.channels_skipped
    );
    println!(
        "Published {} episodes ({} failed).",
        report.episodes_published, report.episodes_failed
    );
    println!(
        "Published {} summaries and {} transcripts ({} failed).",
        report.summaries_published, report.transcripts_published, report.children_failed
    );
}
