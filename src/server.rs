//! Service wiring: builds every component from config and merges the routers.

use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::config::AppConfig;
use crate::identity::{SessionRouteState, SettingsIdentityProvider, session_routes};
use crate::lead::{HttpLeadSink, LeadSink, LoggingLeadSink};
use crate::store::Database;
use crate::trial::{SettingsLocalStorage, TrialManager, TrialRouteState, trial_routes};
use crate::workflows::{WorkflowRouteState, WorkflowRunner, workflow_routes};

/// Handles to the running components.
pub struct App {
    pub router: Router,
    pub trial: Arc<TrialManager>,
    pub identity: Arc<SettingsIdentityProvider>,
}

/// GET /health
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Pick the lead sink: HTTP when an endpoint is configured, log-only otherwise.
pub fn lead_sink(config: &AppConfig) -> Arc<dyn LeadSink> {
    match &config.lead.endpoint {
        Some(endpoint) => {
            info!(%endpoint, "Submitting leads over HTTP");
            Arc::new(HttpLeadSink::new(endpoint.as_str(), &config.lead))
        }
        None => {
            info!("No lead endpoint configured, leads will only be logged");
            Arc::new(LoggingLeadSink)
        }
    }
}

/// Build the trial manager, resolve the initial state and assemble the router.
pub async fn build(config: &AppConfig, db: Arc<dyn Database>) -> App {
    let local = Arc::new(SettingsLocalStorage::new(
        Arc::clone(&db),
        &config.device_id,
    ));
    let identity = SettingsIdentityProvider::new(Arc::clone(&db));
    let leads = lead_sink(config);

    let trial = TrialManager::new(local, identity.clone(), leads, config.lead.clone());
    let state = trial.load_state().await;
    info!(
        device_id = %config.device_id,
        free_uses_remaining = state.free_uses_remaining,
        onboarding_complete = state.onboarding_complete,
        "Trial state loaded"
    );
    let _watcher = trial.watch_identity();

    let runner = Arc::new(WorkflowRunner::new(
        Arc::clone(&trial),
        config.workflow.clone(),
    ));

    let router = Router::new()
        .route("/health", get(health))
        .merge(trial_routes(TrialRouteState {
            manager: Arc::clone(&trial),
        }))
        .merge(session_routes(SessionRouteState {
            provider: Arc::clone(&identity),
        }))
        .merge(workflow_routes(WorkflowRouteState { runner }))
        .layer(CorsLayer::permissive());

    App {
        router,
        trial,
        identity,
    }
}
