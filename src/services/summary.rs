use serde::Serialize;
use utoipa::ToSchema;

use crate::entity::NormalizedSeries;

/// Headline statistics of a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct SeriesSummary {
    pub count: usize,
    /// Value at the most recent phenomenon time.
    pub latest: f64,
    pub min: f64,
    pub max: f64,
}

impl SeriesSummary {
    /// `None` for an empty series; callers show a "no data" state instead.
    pub fn from_series(series: &NormalizedSeries) -> Option<Self> {
        let latest = series.last()?.result;

        let (min, max) = series
            .observations
            .iter()
            .map(|obs| obs.result)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });

        Some(Self {
            count: series.len(),
            latest,
            min,
            max,
        })
    }
}
