use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::AppState;

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "mood-diary",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn readyz(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let cancel = state.shutdown.child_token();
    let store_ok = state.repo.count(&cancel).await.is_ok();

    if store_ok {
        (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "checks": { "store": "ok" },
            })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "not_ready",
                "checks": { "store": "failed" },
            })),
        )
    }
}
