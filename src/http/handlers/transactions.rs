use crate::domain::transaction::{err, TransactionRequest};
use crate::AppState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

pub async fn create_transaction(
    State(state): State<AppState>,
    Json(req): Json<TransactionRequest>,
) -> impl IntoResponse {
    if let Err(message) = req.validate() {
        return (
            axum::http::StatusCode::UNPROCESSABLE_ENTITY,
            Json(err("INVALID_REQUEST", &message)),
        )
            .into_response();
    }

    let resp = state.engine.process(req).await;
    (axum::http::StatusCode::OK, Json(resp)).into_response()
}

pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "service": "FlexiPay Processor Fallback Engine",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
    }))
}
