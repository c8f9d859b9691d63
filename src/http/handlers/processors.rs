use crate::circuit::state::BreakerStatus;
use crate::domain::transaction::err;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::time::Instant;

#[derive(Debug, Serialize)]
pub struct ProcessorStatusResponse {
    pub name: String,
    #[serde(flatten)]
    pub status: BreakerStatus,
    pub fee_rate: f64,
}

/// Health of every processor's breaker, in registration order.
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let now = Instant::now();
    let mut results = Vec::with_capacity(state.processors.len());
    for processor in &state.processors {
        let Some(breaker) = state.registry.get(processor.name()) else {
            continue;
        };
        results.push(ProcessorStatusResponse {
            name: processor.name().to_string(),
            status: breaker.status(now),
            fee_rate: processor.fee_rate(),
        });
    }
    Json(results)
}

pub async fn reset(State(state): State<AppState>, Path(name): Path<String>) -> impl IntoResponse {
    match state.registry.reset(&name) {
        Ok(()) => (
            axum::http::StatusCode::OK,
            Json(serde_json::json!({
                "processor": name,
                "action": "reset",
                "state": "closed",
            })),
        )
            .into_response(),
        Err(e) => not_found(&e.to_string()),
    }
}

#[derive(Debug, Deserialize)]
pub struct InjectParams {
    pub count: usize,
}

pub async fn inject_failures(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<InjectParams>,
) -> impl IntoResponse {
    if params.count < 1 || params.count > 200 {
        return (
            axum::http::StatusCode::UNPROCESSABLE_ENTITY,
            Json(err("INVALID_COUNT", "count must be between 1 and 200")),
        )
            .into_response();
    }

    match state.registry.inject(&name, params.count) {
        Ok(breaker) => {
            let snap = breaker.status(Instant::now());
            (
                axum::http::StatusCode::OK,
                Json(serde_json::json!({
                    "processor": name,
                    "injected_failures": params.count,
                    "state": snap.state.as_str(),
                    "success_rate": snap.success_rate,
                    "total_calls_in_window": snap.total_calls_in_window,
                })),
            )
                .into_response()
        }
        Err(e) => not_found(&e.to_string()),
    }
}

fn not_found(message: &str) -> axum::response::Response {
    (
        axum::http::StatusCode::NOT_FOUND,
        Json(err("PROCESSOR_NOT_FOUND", message)),
    )
        .into_response()
}
