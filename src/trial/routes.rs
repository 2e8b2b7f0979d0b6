//! REST endpoints for the trial gate.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use super::manager::TrialManager;
use super::validation::OnboardingForm;

/// Shared state for trial routes.
#[derive(Clone)]
pub struct TrialRouteState {
    pub manager: Arc<TrialManager>,
}

/// GET /api/trial/status
async fn get_status(State(state): State<TrialRouteState>) -> impl IntoResponse {
    Json(state.manager.status().await)
}

/// POST /api/trial/load
///
/// Re-resolves the state against the current identity (app mount).
async fn load(State(state): State<TrialRouteState>) -> impl IntoResponse {
    state.manager.load_state().await;
    Json(state.manager.status().await)
}

/// POST /api/trial/consume
async fn consume(State(state): State<TrialRouteState>) -> impl IntoResponse {
    let remaining = state.manager.consume_free_use().await;
    Json(serde_json::json!({ "free_uses_remaining": remaining }))
}

/// POST /api/trial/onboarding
///
/// 422 with per-field errors for an invalid form, 502 if the submission
/// failed (the form should offer a retry).
async fn complete_onboarding(
    State(state): State<TrialRouteState>,
    Json(form): Json<OnboardingForm>,
) -> impl IntoResponse {
    let record = match form.validate() {
        Ok(record) => record,
        Err(errors) => {
            let errors: Vec<_> = errors
                .iter()
                .map(|e| serde_json::json!({"field": e.field(), "message": e.to_string()}))
                .collect();
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({ "success": false, "errors": errors })),
            )
                .into_response();
        }
    };

    if state.manager.complete_onboarding(record).await {
        Json(serde_json::json!({
            "success": true,
            "status": state.manager.status().await,
        }))
        .into_response()
    } else {
        (
            StatusCode::BAD_GATEWAY,
            Json(serde_json::json!({
                "success": false,
                "error": "Could not submit your details. Please try again.",
            })),
        )
            .into_response()
    }
}

/// POST /api/trial/reset
async fn reset(State(state): State<TrialRouteState>) -> impl IntoResponse {
    state.manager.reset_onboarding().await;
    Json(state.manager.status().await)
}

/// Build the trial REST routes.
pub fn trial_routes(state: TrialRouteState) -> Router {
    Router::new()
        .route("/api/trial/status", get(get_status))
        .route("/api/trial/load", post(load))
        .route("/api/trial/consume", post(consume))
        .route("/api/trial/onboarding", post(complete_onboarding))
        .route("/api/trial/reset", post(reset))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::config::LeadConfig;
    use crate::error::LeadError;
    use crate::identity::SettingsIdentityProvider;
    use crate::lead::{LeadSink, LeadSubmission, LoggingLeadSink};
    use crate::store::{Database, LibSqlBackend};
    use crate::trial::storage::MemoryLocalStorage;

    struct DownLeads;

    #[async_trait]
    impl LeadSink for DownLeads {
        async fn submit(&self, _lead: &LeadSubmission) -> Result<(), LeadError> {
            Err(LeadError::Request("connection refused".into()))
        }
    }

    async fn app(leads: Arc<dyn LeadSink>) -> Router {
        let db: Arc<dyn Database> = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        let manager = TrialManager::new(
            Arc::new(MemoryLocalStorage::new()),
            SettingsIdentityProvider::new(db),
            leads,
            LeadConfig::default(),
        );
        manager.load_state().await;
        trial_routes(TrialRouteState { manager })
    }

    async fn call(router: &Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post(uri: &str) -> Request<Body> {
        Request::post(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn valid_form() -> serde_json::Value {
        serde_json::json!({
            "name": "Ana Souza",
            "email": "ana@lojaazul.com.br",
            "phone": "(11) 98765-4321",
            "company": "Loja Azul"
        })
    }

    #[tokio::test]
    async fn status_then_consume() {
        let router = app(Arc::new(LoggingLeadSink)).await;

        let (code, body) = call(&router, Request::get("/api/trial/status").body(Body::empty()).unwrap()).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body["free_uses_remaining"], 1);
        assert_eq!(body["phase"], "gated");
        assert_eq!(body["allowed"], true);

        let (_, body) = call(&router, post("/api/trial/consume")).await;
        assert_eq!(body["free_uses_remaining"], 0);
        let (_, body) = call(&router, post("/api/trial/consume")).await;
        assert_eq!(body["free_uses_remaining"], 0);

        let (_, body) = call(&router, Request::get("/api/trial/status").body(Body::empty()).unwrap()).await;
        assert_eq!(body["phase"], "blocked");
        assert_eq!(body["allowed"], false);
    }

    #[tokio::test]
    async fn invalid_form_is_unprocessable() {
        let router = app(Arc::new(LoggingLeadSink)).await;
        let (code, body) = call(
            &router,
            post_json(
                "/api/trial/onboarding",
                serde_json::json!({"name": "Ana", "email": "nope", "phone": "123", "company": ""}),
            ),
        )
        .await;
        assert_eq!(code, StatusCode::UNPROCESSABLE_ENTITY);
        let fields: Vec<_> = body["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["field"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(fields, ["email", "phone", "company"]);
    }

    #[tokio::test]
    async fn successful_onboarding_unlocks() {
        let router = app(Arc::new(LoggingLeadSink)).await;
        call(&router, post("/api/trial/consume")).await;

        let (code, body) = call(&router, post_json("/api/trial/onboarding", valid_form())).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["status"]["phase"], "unlimited");
        assert_eq!(body["status"]["allowed"], true);
    }

    #[tokio::test]
    async fn failed_submission_is_bad_gateway() {
        let router = app(Arc::new(DownLeads)).await;
        call(&router, post("/api/trial/consume")).await;

        let (code, body) = call(&router, post_json("/api/trial/onboarding", valid_form())).await;
        assert_eq!(code, StatusCode::BAD_GATEWAY);
        assert_eq!(body["success"], false);

        let (_, status) = call(&router, Request::get("/api/trial/status").body(Body::empty()).unwrap()).await;
        assert_eq!(status["onboarding_complete"], false);
        assert_eq!(status["phase"], "blocked");
    }

    #[tokio::test]
    async fn reset_returns_fresh_status() {
        let router = app(Arc::new(LoggingLeadSink)).await;
        call(&router, post("/api/trial/consume")).await;
        call(&router, post_json("/api/trial/onboarding", valid_form())).await;

        let (code, body) = call(&router, post("/api/trial/reset")).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body["free_uses_remaining"], 1);
        assert_eq!(body["onboarding_complete"], false);
        assert_eq!(body["phase"], "gated");

        let (_, body) = call(&router, post("/api/trial/load")).await;
        assert_eq!(body["free_uses_remaining"], 1);
    }
}
