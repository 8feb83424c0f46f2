use crate::domain::{Channel, Episode, Summary};
use crate::errors::IngestResult;

#[cfg_attr(test, mockall::automock)]
pub trait TranscriptGenerator: Send + Sync {
    fn transcribe(&self, channel: &Channel, episode: &Episode) -> IngestResult<String>;
}

#[cfg_attr(test, mockall::automock)]
pub trait SummaryGenerator: Send + Sync {
    fn summarize(
        &self,
        channel: &Channel,
        episode: &Episode,
        transcript: &str,
    ) -> IngestResult<Summary>;
}
