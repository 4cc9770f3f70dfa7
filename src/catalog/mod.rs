mod aggregator;
mod error;
mod parsing;
mod source;
mod types;

pub use aggregator::CatalogAggregator;
pub use error::CatalogError;
pub use source::{CatalogSource, HttpFetcher, SourceFetcher};
pub use types::{Catalog, Category, ObjectOverride, OrbitRegime, TrackedObject};
