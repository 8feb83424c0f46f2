use std::sync::Arc;

use catalog_api::{
    CatalogClient, CatalogError, ChannelRef, NewChannel, NewEntry, NewSummary, NewTranscript,
};
use tracing::{debug, info};

use crate::config::Config;
use crate::errors::{IngestError, IngestResult};
use crate::storage::traits::CatalogRepository;

#[derive(Clone)]
pub struct ApiCatalogRepository {
    client: Arc<CatalogClient>,
}

impl ApiCatalogRepository {
    pub fn new(client: CatalogClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    pub fn from_config(config: &Config) -> IngestResult<Self> {
        let client = CatalogClient::new(
            &config.base_url,
            config.url_secret.as_deref(),
            config.request_timeout,
        )
        .map_err(|e| IngestError::Config(e.to_string()))?;

        Ok(Self::new(client))
    }
}

fn publish_error(record: &'static str, err: CatalogError) -> IngestError {
    IngestError::Publish {
        record,
        status: err.status(),
        detail: err.to_string(),
    }
}

impl CatalogRepository for ApiCatalogRepository {
    fn existing_channels(&self) -> IngestResult<Vec<ChannelRef>> {
        let channels = self
            .client
            .list_channels()
            .map_err(|e| IngestError::CatalogUnavailable(e.to_string()))?;

        info!(count = channels.len(), "Retrieved existing channels from the catalog");
        Ok(channels)
    }

    fn create_channel(&self, payload: &NewChannel) -> IngestResult<i64> {
        debug!(rss_url = %payload.rss_url, "Creating channel");
        let created = self
            .client
            .create_channel(payload)
            .map_err(|e| publish_error("channel", e))?;
        Ok(created.id)
    }

    fn create_entry(&self, payload: &NewEntry) -> IngestResult<i64> {
        debug!(channel = payload.channel, "Creating entry");
        let created = self
            .client
            .create_entry(payload)
            .map_err(|e| publish_error("entry", e))?;
        Ok(created.id)
    }

    fn create_summary(&self, payload: &NewSummary) -> IngestResult<i64> {
        let created = self
            .client
            .create_summary(payload)
            .map_err(|e| publish_error("summary", e))?;
        Ok(created.id)
    }

    fn create_transcript(&self, payload: &NewTranscript) -> IngestResult<i64> {
        let created = self
            .client
            .create_transcript(payload)
            .map_err(|e| publish_error("transcript", e))?;
        Ok(created.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn repository(server: &mockito::Server) -> ApiCatalogRepository {
        let client =
            CatalogClient::new(&format!("{}/api/", server.url()), None, Duration::from_secs(5))
                .unwrap();
        ApiCatalogRepository::new(client)
    }

    #[test]
    fn test_listing_failure_is_catalog_unavailable() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/api/channels/limited-fields/")
            .with_status(500)
            .create();

        let result = repository(&server).existing_channels();

        assert!(matches!(result, Err(IngestError::CatalogUnavailable(_))));
    }

    #[test]
    fn test_rejected_create_is_publish_error_with_status() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/api/channels/")
            .with_status(400)
            .with_body(r#"{"rss_url": ["channel with this rss url already exists."]}"#)
            .create();

        let payload = crate::domain::Channel::new("https://a.fm/rss").to_payload();
        let result = repository(&server).create_channel(&payload);

        match result {
            Err(IngestError::Publish { record, status, detail }) => {
                assert_eq!(record, "channel");
                assert_eq!(status, Some(400));
                assert!(detail.contains("already exists"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
