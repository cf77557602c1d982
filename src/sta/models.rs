//! Wire shapes of the SensorThings API.
//!
//! Everything is optional here: servers omit fields freely, and defaults are
//! applied when converting into the types in [`crate::entity`].

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Collection wrapper returned by list endpoints: `{"value": [...]}`.
///
/// Records stay as raw JSON so that one malformed record can be dropped
/// without failing the whole page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub value: Vec<Value>,
    #[serde(default, rename = "@iot.nextLink")]
    pub next_link: Option<String>,
}

/// A `Thing`, optionally with `$expand=Datastreams,Locations`.
#[derive(Debug, Clone, Deserialize)]
pub struct ThingRecord {
    #[serde(default, rename = "@iot.id")]
    pub id: Option<Value>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Free-form; anything but an object is ignored.
    #[serde(default)]
    pub properties: Option<Value>,
    #[serde(default, rename = "Datastreams", deserialize_with = "null_as_empty")]
    pub datastreams: Vec<Value>,
    /// GeoJSON-bearing `Location` entities; only the first is read.
    #[serde(default, rename = "Locations", deserialize_with = "null_as_empty")]
    pub locations: Vec<Value>,
}

/// Expanded navigation links may be `null` rather than absent.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatastreamRecord {
    #[serde(default, rename = "@iot.id")]
    pub id: Option<Value>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "unitOfMeasurement")]
    pub unit_of_measurement: Option<UnitOfMeasurement>,
    #[serde(default, rename = "observedProperty")]
    pub observed_property: Option<ObservedPropertyRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnitOfMeasurement {
    #[serde(default)]
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservedPropertyRecord {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservationRecord {
    /// Instant or `start/end` interval, ISO-8601.
    #[serde(default, rename = "phenomenonTime")]
    pub phenomenon_time: Option<String>,
    /// Usually a number; some servers send numeric strings.
    #[serde(default)]
    pub result: Option<Value>,
}
