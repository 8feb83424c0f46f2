use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "podsum-ingest")]
#[command(about = "Podcast feed ingestion pipeline for the catalog API")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the whole pipeline over RSS_URLS: dedupe, parse, enrich, publish
    Run,

    /// Print the RSS_URLS that are not yet channels in the catalog
    Dedupe,

    /// Resume from the post-parse checkpoint: enrich, then publish
    Enrich,

    /// Resume from the post-enrichment checkpoint and publish pending channels
    Publish,

    /// Show what a checkpoint file holds
    Inspect {
        /// Path to a binary checkpoint
        path: PathBuf,
    },
}
