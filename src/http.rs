//! REST endpoints for subscription and health.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::Zone;
use crate::error::DatabaseError;
use crate::store::{AddOutcome, RecipientStore};

/// Shared state for the routes.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RecipientStore>,
    pub zone: Zone,
}

#[derive(Debug, Deserialize)]
struct SubscribeRequest {
    email: String,
}

/// GET /health
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "timezone": state.zone.name(),
    }))
}

/// POST /api/subscribe
async fn subscribe(
    State(state): State<AppState>,
    Json(req): Json<SubscribeRequest>,
) -> impl IntoResponse {
    match state.store.add_recipient(&req.email).await {
        Ok(AddOutcome::Added) => {
            info!("New subscription");
            (
                StatusCode::CREATED,
                Json(serde_json::json!({"status": "subscribed"})),
            )
        }
        Ok(AddOutcome::AlreadySubscribed) => (
            StatusCode::OK,
            Json(serde_json::json!({"status": "already_subscribed"})),
        ),
        Err(DatabaseError::InvalidEmail(reason)) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": format!("Invalid email address: {reason}")})),
        ),
        Err(e) => {
            error!(error = %e, "Subscription failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Could not save subscription"})),
            )
        }
    }
}

/// Build the subscription and health routes.
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/subscribe", post(subscribe))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
