pub mod client;
pub mod models;
pub mod query;

pub use client::{FetchError, SensorThingsClient};
pub use query::{EntityId, EntityKind, LogicalRequest, QueryParams, TimeWindow};
