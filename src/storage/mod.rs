pub mod catalog_repository;
pub mod checkpoint;
pub mod traits;

pub use catalog_repository::ApiCatalogRepository;
pub use checkpoint::FileBatchStore;
pub use traits::{BatchStore, CatalogRepository};
