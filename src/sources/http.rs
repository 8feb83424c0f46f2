use std::time::Duration;

use reqwest::blocking::Client;
use url::Url;

use crate::errors::{IngestError, IngestResult};
use crate::sources::traits::FeedFetcher;

pub struct HttpFeedFetcher {
    client: Client,
}

impl HttpFeedFetcher {
    pub fn new(timeout: Duration) -> IngestResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("podsum-ingest/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

impl FeedFetcher for HttpFeedFetcher {
    fn fetch(&self, url: &str) -> IngestResult<Vec<u8>> {
        Url::parse(url).map_err(|e| IngestError::feed_parse(url, format!("invalid URL: {}", e)))?;

        let response = self.client.get(url).send()?.error_for_status()?;
        let bytes = response.bytes()?;

        Ok(bytes.to_vec())
    }
}
