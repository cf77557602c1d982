use serde::Serialize;
use std::collections::BTreeMap;
use utoipa::ToSchema;

use super::datastream::Datastream;
use crate::sta::EntityId;

/// Properties surfaced prominently for BGS boreholes, in display order.
const KEY_PROPERTIES: [&str; 3] = ["category", "borehole_reference", "observation_start_date"];

/// Description characters kept in a sensor's display name.
const DISPLAY_DESCRIPTION_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct Coordinates {
    pub longitude: f64,
    pub latitude: f64,
}

/// A monitoring device (`Thing`).
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Sensor {
    pub id: EntityId,
    pub name: String,
    pub description: String,
    pub properties: BTreeMap<String, String>,
    pub location: Option<Coordinates>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct KeyProperty {
    pub label: String,
    pub value: String,
}

impl Sensor {
    /// Name, followed by a truncated description when there is one.
    pub fn display_name(&self) -> String {
        if self.description.is_empty() {
            return self.name.clone();
        }
        let short: String = self
            .description
            .chars()
            .take(DISPLAY_DESCRIPTION_CHARS)
            .collect();
        format!("{} - {short}...", self.name)
    }

    /// The well-known properties present on this sensor, with readable labels.
    pub fn key_properties(&self) -> Vec<KeyProperty> {
        KEY_PROPERTIES
            .iter()
            .filter_map(|key| {
                self.properties.get(*key).map(|value| KeyProperty {
                    label: title_case(key),
                    value: value.clone(),
                })
            })
            .collect()
    }
}

/// A sensor together with the datastreams it owns.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SensorDetail {
    #[serde(flatten)]
    pub sensor: Sensor,
    pub datastreams: Vec<Datastream>,
}

impl SensorDetail {
    pub fn datastream(&self, id: &EntityId) -> Option<&Datastream> {
        self.datastreams.iter().find(|ds| &ds.id == id)
    }
}

/// `borehole_reference` -> `Borehole Reference`
fn title_case(key: &str) -> String {
    key.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
