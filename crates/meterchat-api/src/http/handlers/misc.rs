//! Unauthenticated utility routes.

use axum::http::StatusCode;

/// GET / - greeting.
pub async fn index() -> &'static str {
    "hello there"
}

/// GET /favicon.ico - nothing to serve.
pub async fn favicon() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// GET /health - liveness check (no auth required).
pub async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
