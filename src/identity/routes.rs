//! REST endpoints for the session.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use super::settings_provider::SettingsIdentityProvider;
use super::{AuthenticatedUser, IdentityProvider};

/// Shared state for session routes.
#[derive(Clone)]
pub struct SessionRouteState {
    pub provider: Arc<SettingsIdentityProvider>,
}

#[derive(Debug, Deserialize)]
struct SignInRequest {
    user_id: String,
    #[serde(default)]
    email: Option<String>,
}

/// GET /api/session
async fn get_session(State(state): State<SessionRouteState>) -> impl IntoResponse {
    match state.provider.current_user().await {
        Some(user) => Json(serde_json::json!({"authenticated": true, "user": user})),
        None => Json(serde_json::json!({"authenticated": false})),
    }
}

/// POST /api/session/sign-in
async fn sign_in(
    State(state): State<SessionRouteState>,
    Json(body): Json<SignInRequest>,
) -> impl IntoResponse {
    let user_id = body.user_id.trim();
    if user_id.is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({"error": "user_id is required"})),
        )
            .into_response();
    }
    state
        .provider
        .sign_in(AuthenticatedUser {
            id: user_id.to_string(),
            email: body.email,
        })
        .await;
    StatusCode::NO_CONTENT.into_response()
}

/// POST /api/session/sign-out
async fn sign_out(State(state): State<SessionRouteState>) -> impl IntoResponse {
    state.provider.sign_out().await;
    StatusCode::NO_CONTENT
}

/// Build the session REST routes.
pub fn session_routes(state: SessionRouteState) -> Router {
    Router::new()
        .route("/api/session", get(get_session))
        .route("/api/session/sign-in", post(sign_in))
        .route("/api/session/sign-out", post(sign_out))
        .with_state(state)
}
