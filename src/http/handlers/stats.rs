use crate::AppState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

pub async fn get_stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.stats.snapshot())
}
