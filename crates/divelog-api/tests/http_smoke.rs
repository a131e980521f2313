mod support;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use support::{app, get, post};
use tower::ServiceExt;

#[tokio::test]
async fn health_ready_metrics_endpoints() {
    let (app, state, _store) = app();

    // /health pings the store
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["db"], "reachable");

    // /readyz initially 503
    let (status, _) = get(&app, "/readyz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    divelog_api::set_ready(&state, true);

    let (status, _) = get(&app, "/readyz").await;
    assert_eq!(status, StatusCode::OK);

    // Produce one error so the error counter has a sample
    let (status, _) = post(&app, "/users", r#"{"full_name":""}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // /metrics returns prometheus text and contains our counters
    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let ct = res.headers().get("content-type").unwrap().to_str().unwrap();
    assert!(ct.starts_with("text/plain"));
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("divelog_requests_total"));
    assert!(text.contains("divelog_errors_total"));
    assert!(text.contains("malformed_request"));
}

#[tokio::test]
async fn health_reports_unreachable_store() {
    let (app, _state, store) = app();
    store.set_reachable(false);

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unavailable");
    assert_eq!(body["db"], "unreachable");
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let (app, _state, _store) = app();

    let (status, _) = get(&app, "/divers").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
