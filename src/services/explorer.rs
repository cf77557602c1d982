use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;

use crate::common::Clock;
use crate::entity::{Datastream, NormalizedSeries, Sensor, SensorDetail};
use crate::services::cache::{ResultCache, TtlPolicy};
use crate::services::normalize::{normalize_observations, parse_sensor_detail, parse_sensors};
use crate::sta::{EntityId, FetchError, LogicalRequest, SensorThingsClient, TimeWindow};

pub type EnvelopeCache = ResultCache<LogicalRequest, Arc<Value>>;

/// Cached, failure-tolerant access to a SensorThings service.
///
/// Upstream failures never escape: they are logged and replaced with an
/// empty envelope, which is cached like any other payload.
pub struct SensorExplorer {
    client: SensorThingsClient,
    cache: EnvelopeCache,
    ttl: TtlPolicy,
    clock: Arc<dyn Clock>,
}

impl SensorExplorer {
    pub fn new(
        client: SensorThingsClient,
        ttl: TtlPolicy,
        max_entries: u64,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            client,
            cache: ResultCache::new(max_entries, clock.clone()),
            ttl,
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Payload for `request`, from cache or upstream.
    pub async fn envelope(&self, request: &LogicalRequest) -> Arc<Value> {
        let ttl = self.ttl.for_kind(request.kind());
        self.cache
            .get_or_fetch(request.clone(), ttl, || async {
                Arc::new(self.fetch_or_empty(request).await)
            })
            .await
    }

    async fn fetch_or_empty(&self, request: &LogicalRequest) -> Value {
        match self.client.fetch_request(request).await {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    resource = %request.resource_path(),
                    kind = request.kind().as_str(),
                    "SensorThings fetch failed, substituting empty result"
                );
                FetchError::empty_envelope(request.kind())
            }
        }
    }

    pub async fn sensors(&self, limit: u32, raw_filter: Option<String>) -> Vec<Sensor> {
        let request = LogicalRequest::sensors(limit, raw_filter);
        let envelope = self.envelope(&request).await;
        parse_sensors(&envelope)
    }

    /// `None` when the sensor does not exist or could not be fetched.
    pub async fn sensor_detail(&self, id: EntityId) -> Option<SensorDetail> {
        let request = LogicalRequest::sensor_detail(id);
        let envelope = self.envelope(&request).await;
        parse_sensor_detail(&envelope)
    }

    /// Observations of `datastream` inside `window`, measured back from `now`.
    pub async fn observations(
        &self,
        datastream: &Datastream,
        limit: u32,
        window: TimeWindow,
        now: DateTime<Utc>,
    ) -> NormalizedSeries {
        let request =
            LogicalRequest::observations(datastream.id.clone(), limit, window.filter(now));
        let envelope = self.envelope(&request).await;
        normalize_observations(&envelope, datastream)
    }

    /// Fetch several datastreams concurrently. Empty series are left out.
    pub async fn compare(
        &self,
        datastreams: &[Datastream],
        limit: u32,
        window: TimeWindow,
        now: DateTime<Utc>,
    ) -> Vec<NormalizedSeries> {
        let fetches = datastreams
            .iter()
            .map(|datastream| self.observations(datastream, limit, window, now));

        join_all(fetches)
            .await
            .into_iter()
            .filter(|series| !series.is_empty())
            .collect()
    }

    /// Forget every cached payload so the next request goes upstream.
    /// Requests already in flight are not affected.
    pub async fn refresh(&self) -> usize {
        let cleared = self.cache.invalidate_all().await;
        tracing::info!(cleared, "Cache refreshed");
        cleared
    }
}
