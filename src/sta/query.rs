//! Translation of logical requests into the SensorThings query grammar.
//!
//! Requests are built per interaction and double as cache keys, so every
//! populated field takes part in equality and hashing.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Query parameter name -> value, in a stable order.
pub type QueryParams = BTreeMap<&'static str, String>;

/// Format used for `phenomenonTime` filter bounds.
const FILTER_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Sensors,
    SensorDetail,
    Observations,
}

impl EntityKind {
    /// Whether the API answers this kind with a `{"value": [...]}` envelope.
    pub fn is_collection(self) -> bool {
        !matches!(self, Self::SensorDetail)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sensors => "sensors",
            Self::SensorDetail => "sensor_detail",
            Self::Observations => "observations",
        }
    }
}

/// An `@iot.id` value. Servers may use integer or string identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum EntityId {
    Number(i64),
    Text(String),
}

impl EntityId {
    /// Read an id from a JSON `@iot.id` field.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n.as_i64().map(Self::Number),
            serde_json::Value::String(s) if !s.is_empty() => Some(Self::Text(s.clone())),
            _ => None,
        }
    }

    /// Render the id for use inside a resource path, e.g. `Things(<id>)`.
    ///
    /// String ids are quoted with embedded quotes doubled.
    pub fn path_segment(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => format!("'{}'", s.replace('\'', "''")),
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for EntityId {
    /// Path parameters: integers stay integers, anything else is a string id.
    fn from(s: &str) -> Self {
        s.parse::<i64>()
            .map_or_else(|_| Self::Text(s.to_string()), Self::Number)
    }
}

/// Named look-back windows offered to users.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TimeWindow {
    #[default]
    All,
    Last24Hours,
    Last7Days,
    Last30Days,
    Last90Days,
}

impl TimeWindow {
    pub const ALL: [Self; 5] = [
        Self::All,
        Self::Last24Hours,
        Self::Last7Days,
        Self::Last30Days,
        Self::Last90Days,
    ];

    /// Look-back in hours, or `None` for the "all available" sentinel.
    pub fn hours(self) -> Option<i64> {
        match self {
            Self::All => None,
            Self::Last24Hours => Some(24),
            Self::Last7Days => Some(24 * 7),
            Self::Last30Days => Some(24 * 30),
            Self::Last90Days => Some(24 * 90),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All available",
            Self::Last24Hours => "Last 24 hours",
            Self::Last7Days => "Last 7 days",
            Self::Last30Days => "Last 30 days",
            Self::Last90Days => "Last 90 days",
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Last24Hours => "24h",
            Self::Last7Days => "7d",
            Self::Last30Days => "30d",
            Self::Last90Days => "90d",
        }
    }

    /// Start of the window relative to `now`, truncated to whole seconds.
    pub fn start(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let hours = self.hours()?;
        let start = now - Duration::hours(hours);
        DateTime::from_timestamp(start.timestamp(), 0)
    }

    /// `phenomenonTime ge <start>` predicate, or `None` for [`TimeWindow::All`].
    pub fn filter(self, now: DateTime<Utc>) -> Option<String> {
        self.start(now)
            .map(|start| format!("phenomenonTime ge {}", start.format(FILTER_TIME_FORMAT)))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown time window '{0}' (expected one of: all, 24h, 7d, 30d, 90d)")]
pub struct UnknownTimeWindow(pub String);

impl FromStr for TimeWindow {
    type Err = UnknownTimeWindow;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|w| w.code().eq_ignore_ascii_case(needle) || w.label().eq_ignore_ascii_case(needle))
            .ok_or_else(|| UnknownTimeWindow(s.to_string()))
    }
}

/// A request against the SensorThings API, independent of transport.
///
/// `raw_filter` and `time_filter` are passed through unescaped; callers are
/// trusted to supply valid predicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogicalRequest {
    kind: EntityKind,
    entity_id: Option<EntityId>,
    limit: Option<u32>,
    time_filter: Option<String>,
    raw_filter: Option<String>,
}

impl LogicalRequest {
    /// List sensors (`/Things`).
    pub fn sensors(limit: u32, raw_filter: Option<String>) -> Self {
        Self {
            kind: EntityKind::Sensors,
            entity_id: None,
            limit: Some(limit.max(1)),
            time_filter: None,
            raw_filter: raw_filter.filter(|f| !f.trim().is_empty()),
        }
    }

    /// A single sensor with its datastreams and locations expanded.
    pub fn sensor_detail(id: EntityId) -> Self {
        Self {
            kind: EntityKind::SensorDetail,
            entity_id: Some(id),
            limit: None,
            time_filter: None,
            raw_filter: None,
        }
    }

    /// Newest-first observations of one datastream.
    pub fn observations(datastream_id: EntityId, limit: u32, time_filter: Option<String>) -> Self {
        Self {
            kind: EntityKind::Observations,
            entity_id: Some(datastream_id),
            limit: Some(limit.max(1)),
            time_filter,
            raw_filter: None,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn entity_id(&self) -> Option<&EntityId> {
        self.entity_id.as_ref()
    }

    /// Path relative to the service root.
    #[must_use]
    pub fn resource_path(&self) -> String {
        let id = self
            .entity_id
            .as_ref()
            .map(EntityId::path_segment)
            .unwrap_or_default();

        match self.kind {
            EntityKind::Sensors => "Things".to_string(),
            EntityKind::SensorDetail => format!("Things({id})"),
            EntityKind::Observations => format!("Datastreams({id})/Observations"),
        }
    }

    #[must_use]
    pub fn query_params(&self) -> QueryParams {
        let mut params = QueryParams::new();

        match self.kind {
            EntityKind::Sensors => {
                if let Some(limit) = self.limit {
                    params.insert("$top", limit.to_string());
                }
                if let Some(filter) = &self.raw_filter {
                    params.insert("$filter", filter.clone());
                }
            }
            EntityKind::SensorDetail => {
                params.insert("$expand", "Datastreams,Locations".to_string());
            }
            EntityKind::Observations => {
                if let Some(limit) = self.limit {
                    params.insert("$top", limit.to_string());
                }
                params.insert("$orderby", "phenomenonTime desc".to_string());
                if let Some(filter) = &self.time_filter {
                    params.insert("$filter", filter.clone());
                }
            }
        }

        params
    }
}

impl fmt::Display for LogicalRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.resource_path())?;
        let mut sep = '?';
        for (name, value) in self.query_params() {
            write!(f, "{sep}{name}={value}")?;
            sep = '&';
        }
        Ok(())
    }
}
