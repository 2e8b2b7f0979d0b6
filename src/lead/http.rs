//! HTTP lead sink: POSTs the submission as JSON.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use super::{LeadSink, LeadSubmission};
use crate::config::LeadConfig;
use crate::error::LeadError;

pub struct HttpLeadSink {
    endpoint: String,
    api_key: Option<SecretString>,
    timeout: std::time::Duration,
    client: reqwest::Client,
}

impl HttpLeadSink {
    pub fn new(endpoint: impl Into<String>, config: &LeadConfig) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: config.api_key.clone(),
            timeout: config.timeout,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl LeadSink for HttpLeadSink {
    async fn submit(&self, lead: &LeadSubmission) -> Result<(), LeadError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(lead);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let resp = request.send().await.map_err(|e| {
            if e.is_timeout() {
                LeadError::Timeout(self.timeout)
            } else {
                LeadError::Request(e.to_string())
            }
        })?;

        let status = resp.status();
        if status.is_success() {
            debug!(status = %status, email = %lead.email, "Lead accepted");
            return Ok(());
        }

        let body = resp.text().await.unwrap_or_default();
        warn!(status = %status, "Lead endpoint rejected submission");
        Err(LeadError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use chrono::Utc;
    use tokio::net::TcpListener;
    use tokio::sync::Mutex;

    use super::*;

    #[derive(Clone, Default)]
    struct Captured {
        bodies: Arc<Mutex<Vec<serde_json::Value>>>,
        auth: Arc<Mutex<Vec<String>>>,
    }

    /// Start a lead endpoint on a random port that answers with `status`.
    async fn start_endpoint(status: StatusCode) -> (String, Captured) {
        let captured = Captured::default();
        let app = Router::new()
            .route(
                "/leads",
                post(
                    move |State(c): State<Captured>,
                          headers: HeaderMap,
                          Json(body): Json<serde_json::Value>| async move {
                        c.bodies.lock().await.push(body);
                        if let Some(auth) = headers.get("authorization") {
                            c.auth
                                .lock()
                                .await
                                .push(auth.to_str().unwrap_or_default().to_string());
                        }
                        (status, "done")
                    },
                ),
            )
            .with_state(captured.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://127.0.0.1:{port}/leads"), captured)
    }

    fn lead() -> LeadSubmission {
        LeadSubmission {
            name: "Ana".into(),
            email: "ana@loja.com".into(),
            phone: "11987654321".into(),
            company: "Loja".into(),
            timestamp: Utc::now(),
            source: "content-studio".into(),
            utm_source: "direct".into(),
            utm_medium: "app".into(),
            utm_campaign: "free-trial".into(),
        }
    }

    #[tokio::test]
    async fn created_counts_as_success() {
        let (url, captured) = start_endpoint(StatusCode::CREATED).await;
        let config = LeadConfig {
            api_key: Some(SecretString::from("tok")),
            ..LeadConfig::default()
        };
        let sink = HttpLeadSink::new(url, &config);

        sink.submit(&lead()).await.unwrap();

        let bodies = captured.bodies.lock().await;
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0]["email"], "ana@loja.com");
        assert_eq!(bodies[0]["utm_campaign"], "free-trial");
        assert_eq!(captured.auth.lock().await.as_slice(), ["Bearer tok"]);
    }

    #[tokio::test]
    async fn server_error_is_rejection() {
        let (url, _captured) = start_endpoint(StatusCode::INTERNAL_SERVER_ERROR).await;
        let sink = HttpLeadSink::new(url, &LeadConfig::default());

        match sink.submit(&lead()).await {
            Err(LeadError::Rejected { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "done");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_request_error() {
        // Bind then drop to get a port nobody listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = LeadConfig {
            timeout: Duration::from_secs(2),
            ..LeadConfig::default()
        };
        let sink = HttpLeadSink::new(format!("http://127.0.0.1:{port}/leads"), &config);
        let err = sink.submit(&lead()).await.unwrap_err();
        assert!(matches!(err, LeadError::Request(_) | LeadError::Timeout(_)));
    }
}
