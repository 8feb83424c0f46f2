use catalog_api::{ChannelRef, NewChannel, NewEntry, NewSummary, NewTranscript};

use crate::config::CheckpointPair;
use crate::domain::Batch;
use crate::errors::IngestResult;

/// Remote catalog of published records. Create calls return the server id.
#[cfg_attr(test, mockall::automock)]
pub trait CatalogRepository: Send + Sync {
    fn existing_channels(&self) -> IngestResult<Vec<ChannelRef>>;
    fn create_channel(&self, payload: &NewChannel) -> IngestResult<i64>;
    fn create_entry(&self, payload: &NewEntry) -> IngestResult<i64>;
    fn create_summary(&self, payload: &NewSummary) -> IngestResult<i64>;
    fn create_transcript(&self, payload: &NewTranscript) -> IngestResult<i64>;
}

/// Durable snapshots of a batch between pipeline phases
#[cfg_attr(test, mockall::automock)]
pub trait BatchStore: Send + Sync {
    /// Write both encodings of the batch, or fail without replacing either
    fn save(&self, batch: &Batch, target: &CheckpointPair) -> IngestResult<()>;

    /// Read the batch back from the binary encoding
    fn load(&self, source: &CheckpointPair) -> IngestResult<Batch>;
}
