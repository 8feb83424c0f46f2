use std::collections::HashSet;

use tracing::info;

use crate::errors::IngestResult;
use crate::storage::traits::CatalogRepository;

/// Drops candidate feed URLs the catalog already has a channel for
pub struct DedupService<'a, C: CatalogRepository> {
    catalog: &'a C,
}

impl<'a, C: CatalogRepository> DedupService<'a, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self { catalog }
    }

    /// Candidates with no matching `rss_url` in the catalog, in their original order.
    /// A URL listed more than once is kept at its first position only.
    ///
    /// Fails when the catalog cannot be listed in full; a partial view could let
    /// duplicates through.
    pub fn remove_existing(&self, candidates: &[String]) -> IngestResult<Vec<String>> {
        let existing: HashSet<String> = self
            .catalog
            .existing_channels()?
            .into_iter()
            .filter_map(|c| c.rss_url)
            .collect();

        let mut seen: HashSet<&str> = HashSet::new();
        let remaining: Vec<String> = candidates
            .iter()
            .filter(|url| !existing.contains(url.as_str()) && seen.insert(url.as_str()))
            .cloned()
            .collect();

        info!(
            removed = candidates.len() - remaining.len(),
            remaining = remaining.len(),
            "Removed existing URLs from the input list"
        );

        Ok(remaining)
    }
}
