//! Flattening of SensorThings payloads into the crate's entity types.
//!
//! Every function here accepts the empty substitute envelopes (`{"value": []}`
//! and `{}`) and anything else the server might send; bad records are dropped,
//! never fatal.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::entity::{Coordinates, Datastream, NormalizedSeries, Observation, Sensor, SensorDetail};
use crate::sta::models::{DatastreamRecord, Envelope, ObservationRecord, ThingRecord};
use crate::sta::EntityId;

/// Records of a collection envelope. Non-envelope payloads yield nothing.
fn records(envelope: &Value) -> Vec<Value> {
    let page: Envelope = parse(envelope).unwrap_or_default();
    if let Some(next) = &page.next_link {
        tracing::debug!(next_link = %next, "more records available than requested");
    }
    page.value
}

fn parse<T: DeserializeOwned>(value: &Value) -> Option<T> {
    T::deserialize(value).ok()
}

/// Turn a newest-first observations envelope into an oldest-first series
/// tagged with the datastream's unit and property.
pub fn normalize_observations(envelope: &Value, datastream: &Datastream) -> NormalizedSeries {
    let raw = records(envelope);
    let total = raw.len();

    let mut observations: Vec<Observation> = raw
        .iter()
        .filter_map(parse::<ObservationRecord>)
        .filter_map(|record| {
            let phenomenon_time = parse_phenomenon_time(record.phenomenon_time.as_deref()?)?;
            let result = numeric_result(record.result.as_ref()?)?;
            Some(Observation {
                phenomenon_time,
                result,
            })
        })
        .collect();

    if observations.len() < total {
        tracing::debug!(
            datastream_id = %datastream.id,
            total,
            dropped = total - observations.len(),
            "Dropped malformed observation records"
        );
    }

    observations.sort_by_key(|obs| obs.phenomenon_time);

    NormalizedSeries {
        datastream_id: datastream.id.clone(),
        name: datastream.name.clone(),
        unit: datastream.unit_symbol.clone(),
        property: datastream.observed_property_name.clone(),
        observations,
    }
}

/// Parse an ISO-8601 instant. Intervals (`start/end`) resolve to their start;
/// timestamps without an offset are taken as UTC.
pub fn parse_phenomenon_time(raw: &str) -> Option<DateTime<Utc>> {
    let instant = raw.split('/').next()?.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(instant) {
        return Some(ts.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(instant, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn numeric_result(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Sensors of a `/Things` envelope. Records without an `@iot.id` are skipped.
pub fn parse_sensors(envelope: &Value) -> Vec<Sensor> {
    records(envelope)
        .iter()
        .filter_map(parse::<ThingRecord>)
        .filter_map(|thing| sensor_from_record(&thing))
        .collect()
}

/// A `Things(<id>)?$expand=Datastreams,Locations` payload.
///
/// `None` for the empty substitute object or anything without an id.
pub fn parse_sensor_detail(payload: &Value) -> Option<SensorDetail> {
    let thing: ThingRecord = parse(payload)?;
    let sensor = sensor_from_record(&thing)?;

    let datastreams = thing
        .datastreams
        .iter()
        .filter_map(parse::<DatastreamRecord>)
        .filter_map(|record| datastream_from_record(&record))
        .collect();

    Some(SensorDetail {
        sensor,
        datastreams,
    })
}

/// First location's `(longitude, latitude)`, if it is a numeric array of at
/// least two elements.
pub fn extract_location(payload: &Value) -> Option<Coordinates> {
    let thing: ThingRecord = parse(payload)?;
    location_of(&thing)
}

fn location_of(thing: &ThingRecord) -> Option<Coordinates> {
    let coordinates = thing
        .locations
        .first()?
        .pointer("/location/coordinates")?
        .as_array()?;

    if coordinates.len() < 2 {
        return None;
    }

    Some(Coordinates {
        longitude: coordinates[0].as_f64()?,
        latitude: coordinates[1].as_f64()?,
    })
}

fn sensor_from_record(thing: &ThingRecord) -> Option<Sensor> {
    let id = EntityId::from_json(thing.id.as_ref()?)?;

    let properties: BTreeMap<String, String> = thing
        .properties
        .as_ref()
        .and_then(Value::as_object)
        .into_iter()
        .flatten()
        .map(|(key, value)| (key.clone(), property_text(value)))
        .collect();

    Some(Sensor {
        name: thing
            .name
            .clone()
            .unwrap_or_else(|| format!("Sensor {id}")),
        description: thing.description.clone().unwrap_or_default(),
        properties,
        location: location_of(thing),
        id,
    })
}

fn datastream_from_record(record: &DatastreamRecord) -> Option<Datastream> {
    let id = EntityId::from_json(record.id.as_ref()?)?;

    Some(Datastream {
        name: record
            .name
            .clone()
            .unwrap_or_else(|| format!("Datastream {id}")),
        description: record.description.clone().unwrap_or_default(),
        unit_symbol: record
            .unit_of_measurement
            .as_ref()
            .and_then(|unit| unit.symbol.clone())
            .unwrap_or_default(),
        observed_property_name: record
            .observed_property
            .as_ref()
            .and_then(|property| property.name.clone())
            .unwrap_or_default(),
        id,
    })
}

fn property_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
