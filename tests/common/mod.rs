//! Fake SensorThings server for integration tests.

#![allow(dead_code)]

use axum::{
    extract::{Query, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

use sensor_explorer::config::Config;

/// Requests seen by the fake server, as `(path, query params)`.
#[derive(Default)]
pub struct Upstream {
    pub hits: AtomicUsize,
    pub requests: Mutex<Vec<(String, HashMap<String, String>)>>,
    /// Path -> canned behaviour; unknown paths answer 404.
    pub routes: Mutex<HashMap<String, Canned>>,
}

#[derive(Clone)]
pub enum Canned {
    Json(Value),
    Status(u16, &'static str),
    Garbage(&'static str),
    Slow(Duration),
}

impl Upstream {
    pub fn route(&self, path: &str, canned: Canned) {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), canned);
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn hits_for(&self, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == path)
            .count()
    }

    pub fn last_params(&self, path: &str) -> Option<HashMap<String, String>> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(p, _)| p == path)
            .map(|(_, params)| params.clone())
    }
}

async fn respond(
    State(upstream): State<Arc<Upstream>>,
    uri: Uri,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    upstream.hits.fetch_add(1, Ordering::SeqCst);

    // Strip the service root prefix used by the client base URL
    let path = uri
        .path()
        .trim_start_matches("/v1.1/")
        .to_string();
    upstream
        .requests
        .lock()
        .unwrap()
        .push((path.clone(), params));

    let canned = upstream.routes.lock().unwrap().get(&path).cloned();
    match canned {
        Some(Canned::Json(body)) => Json(body).into_response(),
        Some(Canned::Status(code, body)) => {
            (StatusCode::from_u16(code).unwrap(), body).into_response()
        }
        Some(Canned::Garbage(body)) => (StatusCode::OK, body).into_response(),
        Some(Canned::Slow(delay)) => {
            tokio::time::sleep(delay).await;
            Json(json!({ "value": [] })).into_response()
        }
        None => (StatusCode::NOT_FOUND, "no such resource").into_response(),
    }
}

/// Start a fake server on an ephemeral port. Returns its base URL.
pub async fn spawn_upstream() -> (String, Arc<Upstream>) {
    let upstream = Arc::new(Upstream::default());
    let app = Router::new()
        .fallback(respond)
        .with_state(upstream.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/v1.1"), upstream)
}

pub fn config_for(base_url: &str) -> Config {
    Config {
        sta_base_url: base_url.to_string(),
        sta_timeout_seconds: 1,
        ..Config::default()
    }
}

pub fn things_page() -> Value {
    json!({
        "value": [
            {
                "@iot.id": 1,
                "name": "Borehole A",
                "description": "Groundwater level borehole near Keyworth",
                "properties": { "category": "groundwater" }
            },
            {
                "@iot.id": 2,
                "name": "Borehole B"
            },
            { "name": "no id, skipped" }
        ]
    })
}

pub fn thing_detail() -> Value {
    json!({
        "@iot.id": 1,
        "name": "Borehole A",
        "description": "Groundwater level monitoring borehole",
        "properties": {
            "category": "groundwater",
            "borehole_reference": "SK63NW123",
            "depth_m": 42.5
        },
        "Locations": [
            { "location": { "type": "Point", "coordinates": [-1.0784, 52.8735] } }
        ],
        "Datastreams": [
            {
                "@iot.id": 10,
                "name": "Water level",
                "description": "Level below datum",
                "unitOfMeasurement": { "name": "metre", "symbol": "m" },
                "observedProperty": { "name": "Groundwater level" }
            },
            {
                "@iot.id": 11,
                "name": "Temperature",
                "unitOfMeasurement": { "symbol": "degC" },
                "observedProperty": { "name": "Water temperature" }
            },
            {
                "@iot.id": 12,
                "name": "Conductivity"
            }
        ]
    })
}

/// Newest first, as the server returns them.
pub fn observations_page(points: &[(&str, f64)]) -> Value {
    let value: Vec<Value> = points
        .iter()
        .map(|(t, r)| json!({ "phenomenonTime": t, "result": r }))
        .collect();
    json!({ "value": value })
}
