pub mod dedup_service;
pub mod enrichment_service;
pub mod pipeline;
pub mod publication_service;

pub use dedup_service::DedupService;
pub use enrichment_service::{EnrichmentReport, EnrichmentService};
pub use pipeline::{Checkpoints, Pipeline, RunOutcome, Stage};
pub use publication_service::{PublicationService, PublishReport};
