//! HTTP endpoints.
//!
//! - `/healthz`              : liveness
//! - `/v1/reports/{report}`  : one report as JSON records
//! - `/v1/reports`           : both reports, fetched concurrently
//! - `/metrics`              : exporter self-metrics (Prometheus text)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use cachemgr_core::error::{CacheMgrError, ErrorKind, Result};
use cachemgr_core::protocol::report::ReportKind;
use cachemgr_core::FetchOutcome;

use crate::app_state::AppState;

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        state.metrics().render(),
    )
        .into_response()
}

pub async fn report(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    let Some(kind) = ReportKind::from_endpoint(&name) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "code": "NOT_FOUND", "msg": format!("unknown report: {name}") })),
        )
            .into_response();
    };

    match state.fetch(kind).await {
        Ok(out) => (StatusCode::OK, Json(out)).into_response(),
        Err(e) => (error_status(e.kind()), Json(error_json(&e))).into_response(),
    }
}

pub async fn all_reports(State(state): State<AppState>) -> Response {
    let (counters, service_times) = futures_util::future::join(
        state.fetch(ReportKind::Counters),
        state.fetch(ReportKind::ServiceTimes),
    )
    .await;

    let body = json!({
        "counters": outcome_json(counters),
        "service_times": outcome_json(service_times),
    });
    (StatusCode::OK, Json(body)).into_response()
}

fn outcome_json(res: Result<FetchOutcome>) -> Value {
    match res {
        Ok(out) => serde_json::to_value(out)
            .unwrap_or_else(|e| json!({ "error": { "code": "INTERNAL", "msg": e.to_string() } })),
        Err(e) => json!({ "error": error_json(&e) }),
    }
}

fn error_json(e: &CacheMgrError) -> Value {
    json!({ "code": e.kind().as_str(), "msg": e.to_string() })
}

fn error_status(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Connection | ErrorKind::Protocol => StatusCode::BAD_GATEWAY,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::Config | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
