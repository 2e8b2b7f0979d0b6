//! Runs a workflow behind the trial gate.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use super::model::{GeneratedContent, WorkflowRequest};
use super::templates;
use crate::config::WorkflowConfig;
use crate::error::WorkflowError;
use crate::trial::{FreeUse, TrialManager};

/// Result of a generation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WorkflowOutcome {
    Generated {
        content: GeneratedContent,
        free_uses_remaining: u32,
        /// The onboarding prompt will follow shortly.
        onboarding_prompt_scheduled: bool,
    },
    /// Free uses are exhausted; nothing was generated.
    OnboardingRequired,
}

/// Executes generation requests for every workflow.
pub struct WorkflowRunner {
    trial: Arc<TrialManager>,
    config: WorkflowConfig,
}

impl WorkflowRunner {
    pub fn new(trial: Arc<TrialManager>, config: WorkflowConfig) -> Self {
        Self { trial, config }
    }

    /// Gate, consume, generate.
    ///
    /// A blocked user gets `OnboardingRequired` and a prompt event. Otherwise
    /// a free use is consumed before generating (unless onboarding is done),
    /// and spending the last one schedules the prompt after the configured
    /// delay.
    pub async fn run(&self, request: WorkflowRequest) -> Result<WorkflowOutcome, WorkflowError> {
        request.validate()?;
        let workflow = request.kind();

        let (remaining, prompt) = match self.trial.try_consume_free_use().await {
            FreeUse::Exhausted => {
                info!(%workflow, "Free uses exhausted, onboarding required");
                self.trial.request_onboarding();
                return Ok(WorkflowOutcome::OnboardingRequired);
            }
            FreeUse::Unlimited {
                free_uses_remaining,
            } => (free_uses_remaining, false),
            FreeUse::Consumed {
                free_uses_remaining,
            } => (free_uses_remaining, free_uses_remaining == 0),
        };

        if !self.config.simulated_latency.is_zero() {
            tokio::time::sleep(self.config.simulated_latency).await;
        }
        let content = templates::generate(&request, &mut rand::thread_rng());

        if prompt {
            let trial = Arc::clone(&self.trial);
            let delay = self.config.onboarding_prompt_delay;
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                trial.request_onboarding();
            });
        }

        debug!(%workflow, free_uses_remaining = remaining, "Workflow generated");
        Ok(WorkflowOutcome::Generated {
            content,
            free_uses_remaining: remaining,
            onboarding_prompt_scheduled: prompt,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::LeadConfig;
    use crate::identity::SettingsIdentityProvider;
    use crate::lead::LoggingLeadSink;
    use crate::store::{Database, LibSqlBackend};
    use crate::trial::{MemoryLocalStorage, OnboardingForm, TrialEvent};
    use crate::workflows::model::{BlogPostInput, EmailInput};

    const TEST_TIMEOUT: Duration = Duration::from_secs(2);

    async fn runner() -> WorkflowRunner {
        let db: Arc<dyn Database> = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        let trial = TrialManager::new(
            Arc::new(MemoryLocalStorage::new()),
            SettingsIdentityProvider::new(db),
            Arc::new(LoggingLeadSink),
            LeadConfig::default(),
        );
        trial.load_state().await;
        WorkflowRunner::new(
            trial,
            WorkflowConfig {
                simulated_latency: Duration::ZERO,
                onboarding_prompt_delay: Duration::from_millis(20),
            },
        )
    }

    fn blog() -> WorkflowRequest {
        WorkflowRequest::BlogPost(BlogPostInput {
            topic: "e-commerce".into(),
            ..BlogPostInput::default()
        })
    }

    async fn next_prompt(rx: &mut tokio::sync::broadcast::Receiver<TrialEvent>) {
        tokio::time::timeout(TEST_TIMEOUT, async {
            loop {
                if let Ok(TrialEvent::ShowOnboarding) = rx.recv().await {
                    return;
                }
            }
        })
        .await
        .expect("no onboarding prompt");
    }

    #[tokio::test]
    async fn first_generation_consumes_and_schedules_prompt() {
        let runner = runner().await;
        let mut rx = runner.trial.subscribe();

        let outcome = runner.run(blog()).await.unwrap();
        match outcome {
            WorkflowOutcome::Generated {
                content,
                free_uses_remaining,
                onboarding_prompt_scheduled,
            } => {
                assert!(content.title.contains("e-commerce"));
                assert_eq!(free_uses_remaining, 0);
                assert!(onboarding_prompt_scheduled);
            }
            other => panic!("unexpected {other:?}"),
        }
        next_prompt(&mut rx).await;
    }

    #[tokio::test]
    async fn blocked_user_gets_prompt_without_generation() {
        let runner = runner().await;
        runner.run(blog()).await.unwrap();

        let mut rx = runner.trial.subscribe();
        let outcome = runner.run(blog()).await.unwrap();
        assert_eq!(outcome, WorkflowOutcome::OnboardingRequired);
        next_prompt(&mut rx).await;
        assert_eq!(runner.trial.state().await.free_uses_remaining, 0);
    }

    #[tokio::test]
    async fn onboarded_user_generates_without_consuming() {
        let runner = runner().await;
        runner.run(blog()).await.unwrap();

        let record = OnboardingForm {
            name: "Ana".into(),
            email: "ana@loja.com".into(),
            phone: "11987654321".into(),
            company: "Loja".into(),
        }
        .validate()
        .unwrap();
        assert!(runner.trial.complete_onboarding(record).await);

        for _ in 0..3 {
            match runner.run(blog()).await.unwrap() {
                WorkflowOutcome::Generated {
                    free_uses_remaining,
                    onboarding_prompt_scheduled,
                    ..
                } => {
                    assert_eq!(free_uses_remaining, 0);
                    assert!(!onboarding_prompt_scheduled);
                }
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_requests_spend_the_last_use_once() {
        let runner = Arc::new(runner().await);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let runner = Arc::clone(&runner);
                tokio::spawn(async move { runner.run(blog()).await.unwrap() })
            })
            .collect();

        let mut generated = 0;
        for handle in handles {
            if let WorkflowOutcome::Generated { .. } = handle.await.unwrap() {
                generated += 1;
            }
        }
        assert_eq!(generated, 1);
        assert_eq!(runner.trial.state().await.free_uses_remaining, 0);
    }

    #[tokio::test]
    async fn invalid_input_consumes_nothing() {
        let runner = runner().await;
        let err = runner
            .run(WorkflowRequest::Email(EmailInput::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidInput { .. }));
        assert_eq!(runner.trial.state().await.free_uses_remaining, 1);
    }
}
