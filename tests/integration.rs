use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use shipment_router::api::rest::router;
use shipment_router::config::Config;
use shipment_router::error::AppError;
use shipment_router::routing::{RouteLeg, RoutePath, RoutingProvider, TravelTimeMatrix};
use shipment_router::state::AppState;
use tower::ServiceExt;

/// Routing provider with canned durations per address pair. Unknown pairs
/// cost 9999 seconds; same-address pairs cost zero.
struct MockRouting {
    seconds: HashMap<(String, String), f64>,
}

impl MockRouting {
    fn new(pairs: &[(&str, &str, f64)]) -> Self {
        let seconds = pairs
            .iter()
            .map(|(from, to, s)| ((from.to_string(), to.to_string()), *s))
            .collect();
        Self { seconds }
    }
}

#[async_trait]
impl RoutingProvider for MockRouting {
    async fn travel_time_matrix(
        &self,
        addresses: &[String],
    ) -> Result<TravelTimeMatrix, AppError> {
        let durations = addresses
            .iter()
            .map(|from| {
                addresses
                    .iter()
                    .map(|to| {
                        if from == to {
                            Some(0.0)
                        } else {
                            Some(
                                self.seconds
                                    .get(&(from.clone(), to.clone()))
                                    .copied()
                                    .unwrap_or(9_999.0),
                            )
                        }
                    })
                    .collect()
            })
            .collect();
        Ok(TravelTimeMatrix::new(durations))
    }

    async fn route_path(&self, _base: &str, waypoints: &[String]) -> Result<RoutePath, AppError> {
        let legs = (0..=waypoints.len())
            .map(|_| RouteLeg {
                distance_meters: 2_000.0,
                duration_seconds: 600.0,
            })
            .collect();
        Ok(RoutePath {
            legs,
            polyline: Some("mock-polyline".to_string()),
        })
    }
}

fn test_config() -> Config {
    Config {
        http_port: 0,
        log_level: "info".to_string(),
        base_address: "Base".to_string(),
        routing_url: "http://127.0.0.1:0".to_string(),
        routing_api_key: None,
        plan_debounce_ms: 10,
        plan_queue_size: 64,
        event_buffer_size: 64,
    }
}

fn setup_with(routing: MockRouting) -> (axum::Router, Arc<AppState>) {
    let (state, _plan_rx) = AppState::new(&test_config(), Arc::new(routing));
    let shared = Arc::new(state);
    (router(shared.clone()), shared)
}

fn setup() -> (axum::Router, Arc<AppState>) {
    setup_with(MockRouting::new(&[]))
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn create_shipment(app: &axum::Router, stops: Value) -> Value {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/shipments",
            json!({
                "customer_name": "ACME BV",
                "cargo_type": "box",
                "colli_count": 2,
                "stops": stops
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

#[tokio::test]
async fn health_returns_ok() {
    let (app, _state) = setup();
    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["shipments"], 0);
    assert_eq!(body["archived"], 0);
    assert_eq!(body["has_plan"], false);
}

#[tokio::test]
async fn metrics_returns_prometheus_format() {
    let (app, _state) = setup();
    let response = app.oneshot(get_request("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.contains("text/plain"));

    let body = body_string(response).await;
    assert!(body.contains("stops_in_plan"));
}

#[tokio::test]
async fn create_shipment_assigns_track_code_and_created_status() {
    let (app, _state) = setup();
    let body = create_shipment(
        &app,
        json!([
            { "type": "pickup", "address": "Addr1", "prio": false },
            { "type": "delivery", "address": "Addr2", "prio": false }
        ]),
    )
    .await;

    assert!(body["track_code"].as_str().unwrap().starts_with("DVK"));
    assert_eq!(body["status"], "CREATED");
    assert_eq!(body["colli_count"], 2);
    assert_eq!(body["stops"].as_array().unwrap().len(), 2);
    assert!(body["archived_at"].is_null());
}

#[tokio::test]
async fn create_shipment_without_delivery_returns_400() {
    let (app, _state) = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/shipments",
            json!({
                "customer_name": "ACME BV",
                "stops": [{ "type": "pickup", "address": "Addr1" }]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_shipment_accepts_legacy_address_fields() {
    let (app, _state) = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/shipments",
            json!({
                "customer_name": "Legacy Client",
                "pickup_address": "Old Pickup 1",
                "delivery_address": "Old Drop 2",
                "delivery_prio": true
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let stops = body["stops"].as_array().unwrap();
    assert_eq!(stops.len(), 2);
    assert_eq!(stops[0]["stop_type"], "pickup");
    assert_eq!(stops[1]["stop_type"], "delivery");
    assert_eq!(stops[1]["priority"], true);
}

#[tokio::test]
async fn create_shipment_with_other_cargo_requires_qualifier() {
    let (app, _state) = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/shipments",
            json!({
                "customer_name": "ACME BV",
                "cargo_type": "other",
                "stops": [
                    { "type": "pickup", "address": "Addr1" },
                    { "type": "delivery", "address": "Addr2" }
                ]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_unknown_shipment_returns_404() {
    let (app, _state) = setup();
    let response = app
        .oneshot(get_request(
            "/shipments/00000000-0000-0000-0000-000000000000",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stop_status_walk_derives_overall_and_auto_archives() {
    let (app, _state) = setup();
    let shipment = create_shipment(
        &app,
        json!([
            { "type": "pickup", "address": "Addr1" },
            { "type": "delivery", "address": "Addr2" }
        ]),
    )
    .await;
    let id = shipment["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/shipments/{id}/stops/0/status"),
            json!({ "status": "PICKED_UP" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "PICKED_UP");
    assert!(body["archived_at"].is_null());

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/shipments/{id}/stops/1/proof"),
            json!({
                "receiver_name": "J. Janssen",
                "signature_path": "proof/sig.png",
                "photo1_path": "proof/photo1.jpg"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "DELIVERED");
    assert!(!body["archived_at"].is_null());
    assert_eq!(body["stops"][1]["proof"]["receiver_name"], "J. Janssen");

    // The archived shipment moves to the archived listing.
    let response = app
        .clone()
        .oneshot(get_request("/shipments?archived=true"))
        .await
        .unwrap();
    let archived = body_json(response).await;
    assert_eq!(archived.as_array().unwrap().len(), 1);

    let response = app.oneshot(get_request("/shipments")).await.unwrap();
    let active = body_json(response).await;
    assert_eq!(active.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn delivered_on_pickup_stop_is_rejected_without_side_effects() {
    let (app, _state) = setup();
    let shipment = create_shipment(
        &app,
        json!([
            { "type": "pickup", "address": "Addr1" },
            { "type": "delivery", "address": "Addr2" }
        ]),
    )
    .await;
    let id = shipment["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/shipments/{id}/stops/0/status"),
            json!({ "status": "DELIVERED" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Nothing was written: status unchanged, no event recorded.
    let response = app
        .clone()
        .oneshot(get_request(&format!("/shipments/{id}")))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["status"], "CREATED");
    assert!(body["stops"][0]["status"].is_null());

    let response = app
        .oneshot(get_request(&format!("/shipments/{id}/events")))
        .await
        .unwrap();
    let events = body_json(response).await;
    assert_eq!(events.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn problem_stop_dominates_overall_status() {
    let (app, _state) = setup();
    let shipment = create_shipment(
        &app,
        json!([
            { "type": "pickup", "address": "Addr1" },
            { "type": "delivery", "address": "Addr2" },
            { "type": "delivery", "address": "Addr3" }
        ]),
    )
    .await;
    let id = shipment["id"].as_str().unwrap();

    app.clone()
        .oneshot(json_request(
            "POST",
            &format!("/shipments/{id}/stops/0/status"),
            json!({ "status": "PICKED_UP" }),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/shipments/{id}/stops/2/status"),
            json!({ "status": "PROBLEM", "note": "nobody home" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "PROBLEM");
    assert_eq!(body["problem_note"], "nobody home");
}

#[tokio::test]
async fn proof_is_immutable_once_written() {
    let (app, _state) = setup();
    let shipment = create_shipment(
        &app,
        json!([
            { "type": "pickup", "address": "Addr1" },
            { "type": "delivery", "address": "Addr2" },
            { "type": "delivery", "address": "Addr3" }
        ]),
    )
    .await;
    let id = shipment["id"].as_str().unwrap();

    let proof = json!({
        "receiver_name": "J. Janssen",
        "signature_path": "proof/sig.png"
    });

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/shipments/{id}/stops/1/proof"),
            proof.clone(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/shipments/{id}/stops/1/proof"),
            proof,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn create_with_pre_delivered_stops_archives_immediately() {
    let (app, _state) = setup();
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/shipments",
            json!({
                "customer_name": "Backfill BV",
                "stops": [
                    { "type": "pickup", "address": "Addr1", "status": "PICKED_UP" },
                    { "type": "delivery", "address": "Addr2", "status": "DELIVERED" }
                ]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "DELIVERED");
    assert!(!body["archived_at"].is_null());

    // Straight into the archive listing, never the active one.
    let response = app
        .clone()
        .oneshot(get_request("/shipments?archived=true"))
        .await
        .unwrap();
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);

    let response = app.oneshot(get_request("/shipments")).await.unwrap();
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn edit_that_completes_all_deliveries_archives() {
    let (app, _state) = setup();
    let shipment = create_shipment(
        &app,
        json!([
            { "type": "pickup", "address": "Addr1" },
            { "type": "delivery", "address": "Addr2" },
            { "type": "delivery", "address": "Addr3" }
        ]),
    )
    .await;
    let id = shipment["id"].as_str().unwrap();

    app.clone()
        .oneshot(json_request(
            "POST",
            &format!("/shipments/{id}/stops/0/status"),
            json!({ "status": "PICKED_UP" }),
        ))
        .await
        .unwrap();
    app.clone()
        .oneshot(json_request(
            "POST",
            &format!("/shipments/{id}/stops/1/status"),
            json!({ "status": "DELIVERED" }),
        ))
        .await
        .unwrap();

    // Dropping the outstanding delivery leaves only delivered ones; the
    // edit's recomputation must archive just like a stop-status change would.
    let response = app
        .oneshot(json_request(
            "PUT",
            &format!("/shipments/{id}"),
            json!({
                "customer_name": "ACME BV",
                "stops": [
                    { "type": "pickup", "address": "Addr1" },
                    { "type": "delivery", "address": "Addr2" }
                ]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "DELIVERED");
    assert!(!body["archived_at"].is_null());
}

#[tokio::test]
async fn recovered_problem_clears_the_note() {
    let (app, _state) = setup();
    let shipment = create_shipment(
        &app,
        json!([
            { "type": "pickup", "address": "Addr1" },
            { "type": "delivery", "address": "Addr2" }
        ]),
    )
    .await;
    let id = shipment["id"].as_str().unwrap();

    app.clone()
        .oneshot(json_request(
            "POST",
            &format!("/shipments/{id}/stops/0/status"),
            json!({ "status": "PICKED_UP" }),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/shipments/{id}/stops/1/status"),
            json!({ "status": "PROBLEM", "note": "gate locked" }),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["status"], "PROBLEM");
    assert_eq!(body["problem_note"], "gate locked");

    // The retry succeeds; the stale note must not survive the recovery.
    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/shipments/{id}/stops/1/status"),
            json!({ "status": "DELIVERED" }),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["status"], "DELIVERED");
    assert!(body["problem_note"].is_null());
    assert!(!body["archived_at"].is_null());
}

#[tokio::test]
async fn archived_shipment_rejects_further_status_changes() {
    let (app, _state) = setup();
    let shipment = create_shipment(
        &app,
        json!([
            { "type": "pickup", "address": "Addr1" },
            { "type": "delivery", "address": "Addr2" }
        ]),
    )
    .await;
    let id = shipment["id"].as_str().unwrap();

    app.clone()
        .oneshot(json_request(
            "POST",
            &format!("/shipments/{id}/stops/0/status"),
            json!({ "status": "PICKED_UP" }),
        ))
        .await
        .unwrap();
    app.clone()
        .oneshot(json_request(
            "POST",
            &format!("/shipments/{id}/stops/1/status"),
            json!({ "status": "DELIVERED" }),
        ))
        .await
        .unwrap();

    // Auto-archived; archival is one-way.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/shipments/{id}/stops/0/status"),
            json!({ "status": "PROBLEM" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .oneshot(get_request(&format!("/shipments/{id}")))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert!(!body["archived_at"].is_null());
}

#[tokio::test]
async fn legacy_en_route_is_settable_but_terminal_statuses_are_not() {
    let (app, _state) = setup();
    let shipment = create_shipment(
        &app,
        json!([
            { "type": "pickup", "address": "Addr1" },
            { "type": "delivery", "address": "Addr2" }
        ]),
    )
    .await;
    let id = shipment["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/shipments/{id}/status"),
            json!({ "status": "EN_ROUTE" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "EN_ROUTE");

    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/shipments/{id}/status"),
            json!({ "status": "DELIVERED" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn edit_preserves_status_on_like_for_like_positions() {
    let (app, _state) = setup();
    let shipment = create_shipment(
        &app,
        json!([
            { "type": "pickup", "address": "Addr1" },
            { "type": "delivery", "address": "Addr2" }
        ]),
    )
    .await;
    let id = shipment["id"].as_str().unwrap();

    app.clone()
        .oneshot(json_request(
            "POST",
            &format!("/shipments/{id}/stops/0/status"),
            json!({ "status": "PICKED_UP" }),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/shipments/{id}"),
            json!({
                "customer_name": "ACME BV",
                "stops": [
                    { "type": "pickup", "address": "Addr1 revised" },
                    { "type": "delivery", "address": "Addr2" }
                ]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["stops"][0]["address"], "Addr1 revised");
    assert_eq!(body["stops"][0]["status"], "PICKED_UP");
    assert_eq!(body["status"], "PICKED_UP");
}

#[tokio::test]
async fn plan_with_no_shipments_is_empty() {
    let (app, _state) = setup();
    let response = app
        .clone()
        .oneshot(json_request("POST", "/plan", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["stops"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn plan_orders_stops_with_precedence_and_priority() {
    // Worked example: shipment A (pickup Addr1, delivery Addr2), shipment B
    // (priority pickup Addr3). B's biased cost 1200 * 0.35 = 420 beats A's
    // 600, then precedence holds A's delivery until Addr1 is visited.
    let routing = MockRouting::new(&[
        ("Base", "Addr1", 600.0),
        ("Base", "Addr2", 900.0),
        ("Base", "Addr3", 1_200.0),
        ("Addr1", "Addr2", 300.0),
        ("Addr1", "Addr3", 500.0),
        ("Addr2", "Addr3", 700.0),
        ("Addr3", "Addr1", 500.0),
        ("Addr3", "Addr2", 650.0),
    ]);
    let (app, _state) = setup_with(routing);

    create_shipment(
        &app,
        json!([
            { "type": "pickup", "address": "Addr1", "prio": false },
            { "type": "delivery", "address": "Addr2", "prio": false }
        ]),
    )
    .await;
    create_shipment(
        &app,
        json!([
            { "type": "pickup", "address": "Addr3", "prio": true },
            { "type": "delivery", "address": "Addr2", "prio": false }
        ]),
    )
    .await;

    let response = app
        .clone()
        .oneshot(json_request("POST", "/plan", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let stops = body["stops"].as_array().unwrap();
    assert_eq!(stops.len(), 4);
    assert_eq!(stops[0]["address"], "Addr3");
    assert_eq!(stops[0]["priority"], true);
    assert_eq!(stops[0]["stop_type"], "pickup");
    assert_eq!(
        stops.last().unwrap()["stop_type"],
        "delivery",
        "route must end on a delivery"
    );
    assert_eq!(body["used_fallback"], false);

    // 5 legs of 2 km / 600 s each from the mock path.
    assert_eq!(body["summary"]["total_distance_km"], 10.0);
    assert_eq!(body["summary"]["total_duration_seconds"], 3_000);
    assert_eq!(body["summary"]["duration_text"], "50m");
    assert_eq!(body["polyline"], "mock-polyline");

    // The completed run owns the display slot.
    let response = app.oneshot(get_request("/plan")).await.unwrap();
    let current = body_json(response).await;
    assert_eq!(current["stops"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn plan_skips_visited_stops() {
    let routing = MockRouting::new(&[
        ("Base", "Addr1", 600.0),
        ("Base", "Addr2", 900.0),
        ("Addr1", "Addr2", 300.0),
    ]);
    let (app, _state) = setup_with(routing);

    let shipment = create_shipment(
        &app,
        json!([
            { "type": "pickup", "address": "Addr1" },
            { "type": "delivery", "address": "Addr2" }
        ]),
    )
    .await;
    let id = shipment["id"].as_str().unwrap();

    app.clone()
        .oneshot(json_request(
            "POST",
            &format!("/shipments/{id}/stops/0/status"),
            json!({ "status": "PICKED_UP" }),
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(json_request("POST", "/plan", json!({})))
        .await
        .unwrap();
    let body = body_json(response).await;
    let stops = body["stops"].as_array().unwrap();

    // Only the outstanding delivery remains; its pickup already happened, so
    // it is eligible immediately.
    assert_eq!(stops.len(), 1);
    assert_eq!(stops[0]["address"], "Addr2");
}

#[tokio::test]
async fn delete_shipment_removes_it() {
    let (app, _state) = setup();
    let shipment = create_shipment(
        &app,
        json!([
            { "type": "pickup", "address": "Addr1" },
            { "type": "delivery", "address": "Addr2" }
        ]),
    )
    .await;
    let id = shipment["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/shipments/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get_request(&format!("/shipments/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn events_record_status_walk() {
    let (app, _state) = setup();
    let shipment = create_shipment(
        &app,
        json!([
            { "type": "pickup", "address": "Addr1" },
            { "type": "delivery", "address": "Addr2" }
        ]),
    )
    .await;
    let id = shipment["id"].as_str().unwrap();

    app.clone()
        .oneshot(json_request(
            "POST",
            &format!("/shipments/{id}/stops/0/status"),
            json!({ "status": "PICKED_UP" }),
        ))
        .await
        .unwrap();
    app.clone()
        .oneshot(json_request(
            "POST",
            &format!("/shipments/{id}/stops/1/status"),
            json!({ "status": "DELIVERED" }),
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(get_request(&format!("/shipments/{id}/events")))
        .await
        .unwrap();
    let events = body_json(response).await;
    let events = events.as_array().unwrap();

    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["event_type"], "PICKED_UP");
    assert_eq!(events[0]["stop_index"], 0);
    assert_eq!(events[1]["event_type"], "DELIVERED");
    assert_eq!(events[1]["stop_index"], 1);
}
