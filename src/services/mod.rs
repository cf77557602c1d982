pub mod cache;
pub mod explorer;
pub mod normalize;
pub mod summary;

pub use cache::{CacheEntry, ResultCache, TtlPolicy};
pub use explorer::SensorExplorer;
pub use summary::SeriesSummary;
