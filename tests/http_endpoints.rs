// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use routeros_fleet::{
    AppState, Config, Device, RouterOsConnector, StaticDirectory, SystemProber, TracingAuditSink,
    create_router,
};
use std::sync::Arc;
use tower::ServiceExt;

fn device(id: u32, address: &str, api_port: u16) -> Device {
    Device {
        id,
        name: format!("router-{id}"),
        address: address.to_string(),
        username: "admin".to_string(),
        password: "secret".to_string(),
        api_port,
        snmp_community: "public".to_string(),
    }
}

fn make_state(devices: Vec<Device>) -> Arc<AppState> {
    let mut config = Config::default();
    config.connect.timeout_secs = 2;
    config.connect.max_retries = 0;
    config.resources.timeout_secs = 2;
    config.resources.max_retries = 0;
    config.devices = devices.clone();
    Arc::new(AppState::new(
        config,
        Arc::new(StaticDirectory::new(devices)),
        Arc::new(TracingAuditSink),
        RouterOsConnector,
        SystemProber,
    ))
}

/// A local port with nothing listening on it
async fn closed_port() -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

async fn body_string(resp: axum::response::Response) -> String {
    String::from_utf8(
        resp.into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec(),
    )
    .unwrap()
}

// --- /health endpoint ---

#[tokio::test]
async fn health_returns_ok_with_device_count() {
    let app = create_router(make_state(vec![device(1, "127.0.0.1", 8728)]));

    let resp = app
        .oneshot(Request::get("/health").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let health: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["devices"], 1);
}

// --- /metrics endpoint ---

#[tokio::test]
async fn metrics_returns_200_with_openmetrics_content_type() {
    let app = create_router(make_state(vec![]));

    let resp = app
        .oneshot(Request::get("/metrics").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let ct = resp
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(
        ct.contains("openmetrics-text"),
        "Expected OpenMetrics content-type, got: {ct}"
    );

    let body = body_string(resp).await;
    assert!(body.contains("routeros_devices_scraped 0"));
    assert!(body.contains("routeros_collection_cycle_duration_milliseconds"));
    assert!(body.ends_with("# EOF\n"));
}

// --- /targets endpoint ---

#[tokio::test]
async fn targets_lists_every_device() {
    let app = create_router(make_state(vec![
        device(1, "10.0.0.1", 8728),
        device(2, "10.0.0.2", 8728),
    ]));

    let resp = app
        .oneshot(Request::get("/targets").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let groups: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
    assert_eq!(groups.as_array().unwrap().len(), 2);
    assert_eq!(groups[1]["targets"][0], "10.0.0.2");
    assert_eq!(groups[1]["labels"]["hostname"], "router-2");
    assert_eq!(groups[1]["labels"]["device_id"], "2");
}

// --- /devices endpoints ---

#[tokio::test]
async fn unknown_device_is_404() {
    let app = create_router(make_state(vec![]));

    let resp = app
        .oneshot(
            Request::get("/devices/99/resources")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
    assert_eq!(body["detail"], "Device 99 not found");
}

#[tokio::test]
async fn execute_unknown_template_fails_without_connecting() {
    // Port 1 would refuse; the template is rejected before any connection.
    let app = create_router(make_state(vec![device(1, "127.0.0.1", 1)]));

    let resp = app
        .oneshot(
            Request::post("/devices/1/execute")
                .header("content-type", "application/json")
                .body(r#"{"template_name":"reboot_everything","params":{}}"#.to_string())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let outcome: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
    assert_eq!(outcome["status"], "Failed");
    assert_eq!(outcome["detail"], "Unknown template: reboot_everything");
}

#[tokio::test]
async fn execute_against_closed_port_reports_failure() {
    let port = closed_port().await;
    let app = create_router(make_state(vec![device(1, "127.0.0.1", port)]));

    let resp = app
        .oneshot(
            Request::post("/devices/1/execute")
                .header("content-type", "application/json")
                .body(r#"{"template_name":"set_identity","params":{"name":"edge"}}"#.to_string())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let outcome: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
    assert_eq!(outcome["status"], "Failed");
    assert!(outcome.get("identity").is_none());
}

#[tokio::test]
async fn resources_against_closed_port_is_503() {
    let port = closed_port().await;
    let app = create_router(make_state(vec![device(1, "127.0.0.1", port)]));

    let resp = app
        .oneshot(
            Request::get("/devices/1/resources")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}
