use crate::errors::IngestResult;

#[cfg_attr(test, mockall::automock)]
pub trait FeedFetcher: Send + Sync {
    /// Download the raw feed document
    fn fetch(&self, url: &str) -> IngestResult<Vec<u8>>;
}
