use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::sta::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct Observation {
    pub phenomenon_time: DateTime<Utc>,
    pub result: f64,
}

/// Observations of one datastream, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct NormalizedSeries {
    pub datastream_id: EntityId,
    pub name: String,
    pub unit: String,
    pub property: String,
    pub observations: Vec<Observation>,
}

impl NormalizedSeries {
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn first(&self) -> Option<&Observation> {
        self.observations.first()
    }

    pub fn last(&self) -> Option<&Observation> {
        self.observations.last()
    }
}
