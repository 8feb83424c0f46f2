pub mod batch;
pub mod channel;
pub mod enrichment;
pub mod episode;

pub use batch::{Batch, Pod};
pub use channel::Channel;
pub use enrichment::{Summary, Transcript};
pub use episode::{Episode, EpisodeLink};
