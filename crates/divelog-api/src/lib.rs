use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Result;
use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use divelog_core::{
    CreateDiveRequest, CreateDiveSiteRequest, CreateUserRequest, DiveLogError, DiveLogResult,
    DiveStore, ListDivesParams, ValidationError,
};
use opentelemetry::metrics::{Counter, MeterProvider};
use opentelemetry::KeyValue;
use opentelemetry_prometheus::exporter;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use prometheus::{Encoder, Registry, TextEncoder};
use serde::Serialize;
use serde_json::json;
use tower_http::trace::TraceLayer;

pub struct AppState {
    ready: AtomicBool,
    registry: Registry,
    _provider: SdkMeterProvider,
    requests_total: Counter<u64>,
    errors_total: Counter<u64>,
    store: Arc<dyn DiveStore>,
}

pub fn build_app(store: Arc<dyn DiveStore>) -> Result<(Router, Arc<AppState>)> {
    // Prometheus exporter via OpenTelemetry
    let registry = Registry::new();
    let reader = exporter().with_registry(registry.clone()).build()?;
    let provider = SdkMeterProvider::builder().with_reader(reader).build();
    let meter = provider.meter("divelog-api");

    let requests_total = meter
        .u64_counter("divelog_requests_total")
        .with_description("Total HTTP requests served")
        .init();
    let errors_total = meter
        .u64_counter("divelog_errors_total")
        .with_description("Error responses by error code")
        .init();

    let state = Arc::new(AppState {
        ready: AtomicBool::new(false),
        registry,
        _provider: provider,
        requests_total,
        errors_total,
        store,
    });

    let router = Router::new()
        .route("/health", get(health))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/users", get(list_users).post(create_user))
        .route("/dive-sites", get(list_dive_sites).post(create_dive_site))
        .route("/dives", get(list_dives).post(create_dive))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            count_requests,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::clone(&state));

    Ok((router, state))
}

pub fn set_ready(state: &Arc<AppState>, is_ready: bool) {
    state.ready.store(is_ready, Ordering::Relaxed);
}

async fn count_requests(State(state): State<Arc<AppState>>, req: Request, next: Next) -> Response {
    state.requests_total.add(1, &[]);
    next.run(req).await
}

/// Caller-facing error response
pub struct ApiError(pub DiveLogError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            DiveLogError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            DiveLogError::AlreadyExists { .. } => StatusCode::CONFLICT,
            DiveLogError::InvalidReference { .. } | DiveLogError::InvalidValues { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            DiveLogError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            DiveLogError::Unclassified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = &self.0;
        if !err.is_client_error() {
            let source = std::error::Error::source(err).map(ToString::to_string);
            tracing::error!(code = err.code(), error = %err, source = ?source, "store failure");
        }

        let mut error = json!({
            "code": err.code(),
            "message": err.public_message(),
        });
        if let Some(detail) = err.detail() {
            error["detail"] = detail;
        }

        (self.status(), Json(json!({ "error": error }))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(ValidationError::Body(rejection.body_text()).into())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(ValidationError::Body(rejection.body_text()).into())
    }
}

fn reply<T: Serialize>(state: &AppState, status: StatusCode, result: DiveLogResult<T>) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(err) => reject(state, ApiError(err)),
    }
}

fn reject(state: &AppState, err: ApiError) -> Response {
    state
        .errors_total
        .add(1, &[KeyValue::new("code", err.0.code())]);
    err.into_response()
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "db": "reachable" })),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "store probe failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable", "db": "unreachable" })),
            )
        }
    }
}

async fn readyz(State(state): State<Arc<AppState>>) -> StatusCode {
    if state.ready.load(Ordering::Relaxed) {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = state.registry.gather();
    let mut buf = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buf) {
        tracing::warn!(error=?e, "failed to encode metrics");
    }
    let body = String::from_utf8(buf).unwrap_or_default();
    let header = (
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8"),
    );
    ([header], body)
}

async fn create_user(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Response {
    let new_user = match payload {
        Ok(Json(req)) => req.validate(),
        Err(rejection) => return reject(&state, rejection.into()),
    };
    let result = match new_user {
        Ok(user) => state.store.create_user(&user).await,
        Err(e) => Err(e.into()),
    };
    reply(&state, StatusCode::CREATED, result)
}

async fn list_users(State(state): State<Arc<AppState>>) -> Response {
    let result = state.store.list_users().await;
    reply(&state, StatusCode::OK, result)
}

async fn create_dive_site(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateDiveSiteRequest>, JsonRejection>,
) -> Response {
    let new_site = match payload {
        Ok(Json(req)) => req.validate(),
        Err(rejection) => return reject(&state, rejection.into()),
    };
    let result = match new_site {
        Ok(site) => state.store.create_dive_site(&site).await,
        Err(e) => Err(e.into()),
    };
    reply(&state, StatusCode::CREATED, result)
}

async fn list_dive_sites(State(state): State<Arc<AppState>>) -> Response {
    let result = state.store.list_dive_sites().await;
    reply(&state, StatusCode::OK, result)
}

async fn create_dive(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateDiveRequest>, JsonRejection>,
) -> Response {
    let new_dive = match payload {
        Ok(Json(req)) => req.validate(),
        Err(rejection) => return reject(&state, rejection.into()),
    };
    let result = match new_dive {
        Ok(dive) => state.store.create_dive(&dive).await,
        Err(e) => Err(e.into()),
    };
    reply(&state, StatusCode::CREATED, result)
}

async fn list_dives(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ListDivesParams>, QueryRejection>,
) -> Response {
    let query = match params {
        Ok(Query(params)) => params.validate(),
        Err(rejection) => return reject(&state, rejection.into()),
    };
    let result = match query {
        Ok(query) => state.store.list_dives(query).await,
        Err(e) => Err(e.into()),
    };
    reply(&state, StatusCode::OK, result)
}
