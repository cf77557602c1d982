use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};

use crate::entity::{Coordinates, Datastream, KeyProperty, Sensor, SensorDetail};
use crate::sta::EntityId;

#[derive(Debug, Serialize, ToSchema)]
pub struct SensorResponse {
    pub id: EntityId,
    pub name: String,
    pub description: String,
    /// Name plus a shortened description, for pickers
    pub display_name: String,
    pub location: Option<Coordinates>,
}

impl From<Sensor> for SensorResponse {
    fn from(s: Sensor) -> Self {
        Self {
            display_name: s.display_name(),
            id: s.id,
            name: s.name,
            description: s.description,
            location: s.location,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DatastreamResponse {
    pub id: EntityId,
    pub name: String,
    pub description: String,
    /// Name plus unit, e.g. `Temperature (°C)`
    pub display_name: String,
    pub unit: String,
    pub property: String,
}

impl From<&Datastream> for DatastreamResponse {
    fn from(ds: &Datastream) -> Self {
        Self {
            id: ds.id.clone(),
            name: ds.name.clone(),
            description: ds.description.clone(),
            display_name: ds.display_name(),
            unit: ds.unit_symbol.clone(),
            property: ds.observed_property_name.clone(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SensorDetailResponse {
    pub id: EntityId,
    pub name: String,
    pub description: String,
    pub properties: BTreeMap<String, String>,
    /// Well-known properties with readable labels
    pub key_properties: Vec<KeyProperty>,
    pub location: Option<Coordinates>,
    pub datastreams: Vec<DatastreamResponse>,
}

impl From<SensorDetail> for SensorDetailResponse {
    fn from(detail: SensorDetail) -> Self {
        let datastreams = detail.datastreams.iter().map(DatastreamResponse::from).collect();
        let key_properties = detail.sensor.key_properties();
        let sensor = detail.sensor;

        Self {
            id: sensor.id,
            name: sensor.name,
            description: sensor.description,
            properties: sensor.properties,
            key_properties,
            location: sensor.location,
            datastreams,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SensorsQuery {
    /// Maximum number of sensors (default from configuration)
    pub limit: Option<u32>,
    /// Raw SensorThings `$filter` predicate, passed through unchecked
    pub filter: Option<String>,
}
