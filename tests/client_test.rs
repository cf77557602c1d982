//! Fetch client and retrieval service against a fake SensorThings server.
//!
//! Run with: cargo test --test client_test

mod common;

use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use common::{config_for, spawn_upstream, Canned};
use sensor_explorer::common::ManualClock;
use sensor_explorer::entity::Datastream;
use sensor_explorer::services::{SensorExplorer, SeriesSummary, TtlPolicy};
use sensor_explorer::sta::{EntityId, FetchError, LogicalRequest, SensorThingsClient, TimeWindow};

fn level(id: i64) -> Datastream {
    Datastream {
        id: EntityId::Number(id),
        name: format!("Level {id}"),
        description: String::new(),
        unit_symbol: "m".to_string(),
        observed_property_name: "Groundwater level".to_string(),
    }
}

fn explorer(base_url: &str, clock: Arc<ManualClock>) -> SensorExplorer {
    let client = SensorThingsClient::new(&config_for(base_url)).unwrap();
    SensorExplorer::new(client, TtlPolicy::default(), 1_000, clock)
}

fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap(),
    ))
}

#[tokio::test]
async fn fetch_returns_parsed_json_and_sends_query() {
    let (base_url, upstream) = spawn_upstream().await;
    upstream.route("Things", Canned::Json(common::things_page()));

    let client = SensorThingsClient::new(&config_for(&base_url)).unwrap();
    let request = LogicalRequest::sensors(1000, Some("name eq 'Borehole A'".to_string()));
    let payload = client.fetch_request(&request).await.unwrap();

    assert_eq!(payload["value"].as_array().unwrap().len(), 3);
    let params = upstream.last_params("Things").unwrap();
    assert_eq!(params.get("$top").map(String::as_str), Some("1000"));
    assert_eq!(
        params.get("$filter").map(String::as_str),
        Some("name eq 'Borehole A'")
    );
}

#[tokio::test]
async fn non_success_status_is_request_failure() {
    let (base_url, upstream) = spawn_upstream().await;
    upstream.route("Things", Canned::Status(500, "boom"));

    let client = SensorThingsClient::new(&config_for(&base_url)).unwrap();
    let err = client
        .fetch_request(&LogicalRequest::sensors(10, None))
        .await
        .unwrap_err();

    match err {
        FetchError::Request { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected request failure, got {other:?}"),
    }
}

#[tokio::test]
async fn unparseable_body_is_decode_failure() {
    let (base_url, upstream) = spawn_upstream().await;
    upstream.route("Things", Canned::Garbage("<html>maintenance</html>"));

    let client = SensorThingsClient::new(&config_for(&base_url)).unwrap();
    let err = client
        .fetch_request(&LogicalRequest::sensors(10, None))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Decode(_)), "{err:?}");
}

#[tokio::test]
async fn timeout_is_transport_failure() {
    let (base_url, upstream) = spawn_upstream().await;
    upstream.route("Things", Canned::Slow(Duration::from_secs(2)));

    let client = SensorThingsClient::new(&config_for(&base_url)).unwrap();
    let request = LogicalRequest::sensors(10, None);
    let err = client
        .fetch(
            &request.resource_path(),
            &request.query_params(),
            Duration::from_millis(200),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Transport(_)), "{err:?}");
}

#[tokio::test]
async fn refused_connection_is_transport_failure() {
    // Bind then drop to get a port nothing listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = SensorThingsClient::new(&config_for(&format!("http://{addr}/v1.1"))).unwrap();
    let err = client
        .fetch_request(&LogicalRequest::sensors(10, None))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Transport(_)), "{err:?}");
}

#[tokio::test]
async fn timed_out_observations_end_as_unavailable_summary() {
    let (base_url, upstream) = spawn_upstream().await;
    upstream.route(
        "Datastreams(10)/Observations",
        Canned::Slow(Duration::from_secs(3)),
    );

    let explorer = explorer(&base_url, manual_clock());
    let series = explorer
        .observations(&level(10), 200, TimeWindow::Last7Days, explorer.now())
        .await;

    assert!(series.is_empty());
    assert!(SeriesSummary::from_series(&series).is_none());
}

#[tokio::test]
async fn observations_are_fetched_with_window_and_cached() {
    let (base_url, upstream) = spawn_upstream().await;
    upstream.route(
        "Datastreams(10)/Observations",
        Canned::Json(common::observations_page(&[
            ("2024-01-07T00:00:00Z", 2.0),
            ("2024-01-06T00:00:00Z", 9.0),
            ("2024-01-05T00:00:00Z", 5.0),
        ])),
    );

    let clock = manual_clock();
    let explorer = explorer(&base_url, clock.clone());

    let series = explorer
        .observations(&level(10), 200, TimeWindow::Last7Days, explorer.now())
        .await;
    assert_eq!(series.len(), 3);
    assert_eq!(series.last().unwrap().result, 2.0);

    let params = upstream.last_params("Datastreams(10)/Observations").unwrap();
    assert_eq!(params.get("$top").map(String::as_str), Some("200"));
    assert_eq!(
        params.get("$orderby").map(String::as_str),
        Some("phenomenonTime desc")
    );
    assert_eq!(
        params.get("$filter").map(String::as_str),
        Some("phenomenonTime ge 2024-01-01T00:00:00Z")
    );

    // Windowed filters move with the clock; use the unfiltered request to
    // observe the TTL
    explorer.observations(&level(10), 200, TimeWindow::All, explorer.now()).await;
    assert_eq!(upstream.hits_for("Datastreams(10)/Observations"), 2);

    clock.advance(ChronoDuration::seconds(59));
    explorer.observations(&level(10), 200, TimeWindow::All, explorer.now()).await;
    assert_eq!(upstream.hits_for("Datastreams(10)/Observations"), 2);

    clock.advance(ChronoDuration::seconds(1));
    explorer.observations(&level(10), 200, TimeWindow::All, explorer.now()).await;
    assert_eq!(upstream.hits_for("Datastreams(10)/Observations"), 3);
}

#[tokio::test]
async fn failed_fetch_is_cached_until_refresh() {
    let (base_url, upstream) = spawn_upstream().await;
    upstream.route("Things(1)", Canned::Status(503, "down"));

    let explorer = explorer(&base_url, manual_clock());

    assert!(explorer.sensor_detail(EntityId::Number(1)).await.is_none());
    assert!(explorer.sensor_detail(EntityId::Number(1)).await.is_none());
    assert_eq!(upstream.hits_for("Things(1)"), 1);

    // Server recovers, but the cached substitute masks it until refresh
    upstream.route("Things(1)", Canned::Json(common::thing_detail()));
    assert!(explorer.sensor_detail(EntityId::Number(1)).await.is_none());

    assert_eq!(explorer.refresh().await, 1);
    let detail = explorer.sensor_detail(EntityId::Number(1)).await.unwrap();
    assert_eq!(detail.datastreams.len(), 3);
    assert_eq!(upstream.hits_for("Things(1)"), 2);

    let params = upstream.last_params("Things(1)").unwrap();
    assert_eq!(
        params.get("$expand").map(String::as_str),
        Some("Datastreams,Locations")
    );
}

#[tokio::test]
async fn compare_joins_all_and_drops_empty_series() {
    let (base_url, upstream) = spawn_upstream().await;
    upstream.route(
        "Datastreams(10)/Observations",
        Canned::Json(common::observations_page(&[("2024-01-07T00:00:00Z", 1.0)])),
    );
    upstream.route(
        "Datastreams(11)/Observations",
        Canned::Json(json!({ "value": [] })),
    );
    upstream.route(
        "Datastreams(12)/Observations",
        Canned::Json(common::observations_page(&[
            ("2024-01-07T00:00:00Z", 3.0),
            ("2024-01-06T00:00:00Z", 4.0),
        ])),
    );
    // 13 is unknown upstream and answers 404

    let explorer = explorer(&base_url, manual_clock());
    let series = explorer
        .compare(
            &[level(10), level(11), level(12), level(13)],
            200,
            TimeWindow::All,
            explorer.now(),
        )
        .await;

    let ids: Vec<EntityId> = series.iter().map(|s| s.datastream_id.clone()).collect();
    assert_eq!(ids, vec![EntityId::Number(10), EntityId::Number(12)]);
    assert_eq!(upstream.hits(), 4);
}
