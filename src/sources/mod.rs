pub mod http;
pub mod normalizer;
pub mod traits;

pub use http::HttpFeedFetcher;
pub use normalizer::{parse_feed, FeedNormalizer};
pub use traits::FeedFetcher;
