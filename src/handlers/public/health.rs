use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET / - service information
pub async fn root() -> Json<Value> {
    Json(json!({
        "name": "Contacts API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "login": "POST /api/auth/login (public)",
            "users": "/api/auth/users[/:id] (admin)",
            "contacts": "/api/contacts[/list|/:id] (authenticated)",
            "health": "GET /health (public)",
        }
    }))
}

/// GET /health - store connectivity
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.db.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": state.db.backend_name(),
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": state.db.backend_name(),
                    "error": "database unavailable",
                })),
            )
        }
    }
}
