//! REST endpoint for content generation.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use super::model::WorkflowRequest;
use super::runner::WorkflowRunner;

#[derive(Clone)]
pub struct WorkflowRouteState {
    pub runner: Arc<WorkflowRunner>,
}

/// POST /api/workflows/generate
async fn generate(
    State(state): State<WorkflowRouteState>,
    Json(request): Json<WorkflowRequest>,
) -> impl IntoResponse {
    match state.runner.run(request).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

pub fn workflow_routes(state: WorkflowRouteState) -> Router {
    Router::new()
        .route("/api/workflows/generate", post(generate))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::config::{LeadConfig, WorkflowConfig};
    use crate::identity::SettingsIdentityProvider;
    use crate::lead::LoggingLeadSink;
    use crate::store::{Database, LibSqlBackend};
    use crate::trial::{MemoryLocalStorage, TrialManager};

    async fn app() -> Router {
        let db: Arc<dyn Database> = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        let trial = TrialManager::new(
            Arc::new(MemoryLocalStorage::new()),
            SettingsIdentityProvider::new(db),
            Arc::new(LoggingLeadSink),
            LeadConfig::default(),
        );
        trial.load_state().await;
        let runner = WorkflowRunner::new(
            trial,
            WorkflowConfig {
                simulated_latency: Duration::ZERO,
                onboarding_prompt_delay: Duration::ZERO,
            },
        );
        workflow_routes(WorkflowRouteState {
            runner: Arc::new(runner),
        })
    }

    async fn send(router: &Router, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let req = Request::post("/api/workflows/generate")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn generate_then_gate() {
        let router = app().await;
        let body = serde_json::json!({
            "workflow": "ad_copy",
            "product": "Fone Bluetooth",
            "platform": "meta_ads"
        });

        let (code, json) = send(&router, body.clone()).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(json["status"], "generated");
        assert_eq!(json["free_uses_remaining"], 0);
        assert_eq!(json["content"]["workflow"], "ad_copy");
        assert_eq!(json["onboarding_prompt_scheduled"], true);

        let (code, json) = send(&router, body).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(json["status"], "onboarding_required");
    }

    #[tokio::test]
    async fn blank_required_field_is_unprocessable() {
        let router = app().await;
        let (code, json) = send(
            &router,
            serde_json::json!({"workflow": "product_description", "product_name": " "}),
        )
        .await;
        assert_eq!(code, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json["error"].as_str().unwrap().contains("product_name"));
    }
}
