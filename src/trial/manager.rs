//! TrialManager owns the free-use counter and onboarding flag, and keeps
//! them in sync with whichever store is authoritative.
//!
//! In-memory state is always updated first. Persistence runs on a single
//! background writer so writes land in call order; failures there are logged
//! and never rolled back.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{RwLock, broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::model::{DEFAULT_FREE_USES, IdentityMode, OnboardingRecord, TrialState, local_keys};
use super::reconcile::{LocalSnapshot, reconcile};
use super::state::TrialPhase;
use super::storage::LocalStorage;
use crate::config::LeadConfig;
use crate::identity::{AuthenticatedUser, IdentityProvider, metadata_keys};
use crate::lead::{LeadSink, LeadSubmission};

/// Default broadcast channel capacity.
const DEFAULT_BROADCAST_CAPACITY: usize = 64;

/// Notifications for UI subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrialEvent {
    StateChanged { state: TrialState, phase: TrialPhase },
    /// The onboarding form should be shown.
    ShowOnboarding,
}

/// Trial status returned by the REST endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct TrialStatus {
    #[serde(flatten)]
    pub state: TrialState,
    pub phase: TrialPhase,
    pub allowed: bool,
}

/// Result of [`TrialManager::try_consume_free_use`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreeUse {
    /// Onboarding is complete; nothing was consumed.
    Unlimited { free_uses_remaining: u32 },
    /// One use was spent.
    Consumed { free_uses_remaining: u32 },
    /// Nothing left to spend; onboarding is required.
    Exhausted,
}

/// A queued persistence write.
enum PersistJob {
    Local {
        key: &'static str,
        value: Option<String>,
    },
    Remote {
        user_id: String,
        patch: serde_json::Map<String, serde_json::Value>,
    },
    Flush(oneshot::Sender<()>),
}

struct Inner {
    state: TrialState,
    phase: TrialPhase,
    /// Signed-in user the state was resolved for.
    user_id: Option<String>,
}

/// Single authority for "may the current user generate for free right now".
pub struct TrialManager {
    local: Arc<dyn LocalStorage>,
    identity: Arc<dyn IdentityProvider>,
    leads: Arc<dyn LeadSink>,
    lead_config: LeadConfig,
    inner: RwLock<Inner>,
    writer: mpsc::UnboundedSender<PersistJob>,
    events: broadcast::Sender<TrialEvent>,
}

impl TrialManager {
    /// Create the manager and spawn its persistence writer.
    pub fn new(
        local: Arc<dyn LocalStorage>,
        identity: Arc<dyn IdentityProvider>,
        leads: Arc<dyn LeadSink>,
        lead_config: LeadConfig,
    ) -> Arc<Self> {
        let (writer, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(Arc::clone(&local), Arc::clone(&identity), rx));
        let (events, _rx) = broadcast::channel(DEFAULT_BROADCAST_CAPACITY);

        Arc::new(Self {
            local,
            identity,
            leads,
            lead_config,
            inner: RwLock::new(Inner {
                state: TrialState::default(),
                phase: TrialPhase::Uninitialized,
                user_id: None,
            }),
            writer,
            events,
        })
    }

    /// Subscribe to trial events.
    pub fn subscribe(&self) -> broadcast::Receiver<TrialEvent> {
        self.events.subscribe()
    }

    /// Current in-memory state.
    pub async fn state(&self) -> TrialState {
        self.inner.read().await.state.clone()
    }

    pub async fn phase(&self) -> TrialPhase {
        self.inner.read().await.phase
    }

    pub async fn status(&self) -> TrialStatus {
        let inner = self.inner.read().await;
        TrialStatus {
            allowed: inner.state.is_allowed(),
            state: inner.state.clone(),
            phase: inner.phase,
        }
    }

    /// Resolve the trial state for the current identity.
    ///
    /// Never fails: any read error yields `{1 free use, not onboarded}`.
    pub async fn load_state(&self) -> TrialState {
        self.set_phase(TrialPhase::Loading).await;
        // Pending counter writes must land before we read them back.
        self.flush().await;

        let user = self.identity.current_user().await;
        let mode = match user {
            Some(_) => IdentityMode::Authenticated,
            None => IdentityMode::Anonymous,
        };

        let state = match self.resolve(user.as_ref(), mode).await {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, mode = %mode, "Failed to load trial state, using defaults");
                TrialState::fresh(mode)
            }
        };

        let phase = TrialPhase::of(&state);
        {
            let mut inner = self.inner.write().await;
            inner.state = state.clone();
            inner.phase = phase;
            inner.user_id = user.map(|u| u.id);
        }

        info!(
            mode = %mode,
            phase = %phase,
            free_uses_remaining = state.free_uses_remaining,
            "Trial state loaded"
        );
        self.publish(state.clone(), phase);
        state
    }

    async fn resolve(
        &self,
        user: Option<&AuthenticatedUser>,
        mode: IdentityMode,
    ) -> crate::error::Result<TrialState> {
        let complete_raw = self.local.get_item(local_keys::ONBOARDING_COMPLETE).await?;
        let fast = LocalSnapshot::from_raw(complete_raw.as_deref(), None);
        if fast.onboarding_complete {
            debug!("Local onboarding flag set, skipping remote read");
            return Ok(reconcile(&fast, None, mode));
        }

        let free_raw = self.local.get_item(local_keys::FREE_USES_REMAINING).await?;
        let local = LocalSnapshot::from_raw(complete_raw.as_deref(), free_raw.as_deref());

        let Some(user) = user else {
            return Ok(reconcile(&local, None, IdentityMode::Anonymous));
        };

        let remote = self.identity.get_user_metadata(&user.id).await?;
        let state = reconcile(&local, Some(&remote), IdentityMode::Authenticated);

        if state.onboarding_complete {
            if let Err(e) = self
                .local
                .set_item(local_keys::ONBOARDING_COMPLETE, "true")
                .await
            {
                warn!(error = %e, "Failed to mirror onboarding flag locally");
            }
        }
        Ok(state)
    }

    /// Consume one free use and return the new remaining count.
    ///
    /// Saturates at zero and is a no-op once onboarding is complete. The
    /// decrement is visible before this returns; the write is queued.
    pub async fn consume_free_use(&self) -> u32 {
        let (remaining, state, phase) = {
            let mut inner = self.inner.write().await;
            if inner.state.onboarding_complete {
                debug!("Consume called while unlimited, ignoring");
                return inner.state.free_uses_remaining;
            }
            let remaining = self.decrement(&mut inner);
            (remaining, inner.state.clone(), inner.phase)
        };

        info!(free_uses_remaining = remaining, "Free use consumed");
        self.publish(state, phase);
        remaining
    }

    /// Gate check and consume under one lock.
    ///
    /// Concurrent callers cannot both spend the last free use.
    pub async fn try_consume_free_use(&self) -> FreeUse {
        let (remaining, state, phase) = {
            let mut inner = self.inner.write().await;
            if inner.state.onboarding_complete {
                return FreeUse::Unlimited {
                    free_uses_remaining: inner.state.free_uses_remaining,
                };
            }
            if inner.state.free_uses_remaining == 0 {
                return FreeUse::Exhausted;
            }
            let remaining = self.decrement(&mut inner);
            (remaining, inner.state.clone(), inner.phase)
        };

        info!(free_uses_remaining = remaining, "Free use consumed");
        self.publish(state, phase);
        FreeUse::Consumed {
            free_uses_remaining: remaining,
        }
    }

    /// Decrement the counter and queue its writes. Caller holds the lock.
    ///
    /// The device copy is written in both modes so a later sign-out cannot
    /// resurrect a spent use.
    fn decrement(&self, inner: &mut Inner) -> u32 {
        let remaining = inner.state.free_uses_remaining.saturating_sub(1);
        inner.state.free_uses_remaining = remaining;
        inner.phase = TrialPhase::of(&inner.state);

        if let (IdentityMode::Authenticated, Some(user_id)) =
            (inner.state.identity_mode, inner.user_id.as_ref())
        {
            self.enqueue(PersistJob::Remote {
                user_id: user_id.clone(),
                patch: patch([(
                    metadata_keys::FREE_USES_REMAINING,
                    serde_json::json!(remaining),
                )]),
            });
        }
        self.enqueue(PersistJob::Local {
            key: local_keys::FREE_USES_REMAINING,
            value: Some(remaining.to_string()),
        });
        remaining
    }

    /// Submit the onboarding lead and, on success, grant unlimited use.
    ///
    /// Returns `false` (state untouched) if the lead submission or the
    /// identity-provider write fails.
    pub async fn complete_onboarding(&self, record: OnboardingRecord) -> bool {
        let lead = LeadSubmission::from_record(&record, &self.lead_config);
        if let Err(e) = self.leads.submit(&lead).await {
            warn!(error = %e, email = %record.email, "Lead submission failed");
            return false;
        }

        self.flush().await;

        let (mode, user_id) = {
            let inner = self.inner.read().await;
            (inner.state.identity_mode, inner.user_id.clone())
        };

        let record_json = match serde_json::to_value(&record) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "Failed to serialize onboarding record");
                return false;
            }
        };

        match (mode, user_id) {
            (IdentityMode::Authenticated, Some(user_id)) => {
                let update = patch([
                    (metadata_keys::ONBOARDING_COMPLETE, serde_json::json!(true)),
                    (metadata_keys::ONBOARDING_DATA, record_json),
                    (
                        metadata_keys::ONBOARDING_DATE,
                        serde_json::json!(record.submitted_at.to_rfc3339()),
                    ),
                ]);
                if let Err(e) = self.identity.update_user_metadata(&user_id, update).await {
                    warn!(error = %e, user_id = %user_id, "Failed to record onboarding in identity metadata");
                    return false;
                }
            }
            _ => {
                if let Err(e) = self
                    .local
                    .set_item(local_keys::ONBOARDING_DATA, &record_json.to_string())
                    .await
                {
                    warn!(error = %e, "Failed to back up onboarding record locally");
                }
            }
        }

        if let Err(e) = self
            .local
            .set_item(local_keys::ONBOARDING_COMPLETE, "true")
            .await
        {
            warn!(error = %e, "Failed to set local onboarding flag");
        }

        let state = {
            let mut inner = self.inner.write().await;
            inner.state.onboarding_complete = true;
            inner.state.onboarding_record = Some(record);
            inner.phase = TrialPhase::Unlimited;
            inner.state.clone()
        };

        info!(mode = %mode, "Onboarding completed");
        self.publish(state, TrialPhase::Unlimited);
        true
    }

    /// Reset to one free use and no onboarding, in memory and in every
    /// authoritative store. Demo/testing utility.
    pub async fn reset_onboarding(&self) {
        let (state, user_id) = {
            let mut inner = self.inner.write().await;
            let mode = inner.state.identity_mode;
            inner.state = TrialState::fresh(mode);
            inner.phase = TrialPhase::Gated;
            let user_id = match mode {
                IdentityMode::Authenticated => inner.user_id.clone(),
                IdentityMode::Anonymous => None,
            };
            (inner.state.clone(), user_id)
        };

        self.enqueue(PersistJob::Local {
            key: local_keys::ONBOARDING_COMPLETE,
            value: None,
        });
        self.enqueue(PersistJob::Local {
            key: local_keys::FREE_USES_REMAINING,
            value: Some(DEFAULT_FREE_USES.to_string()),
        });
        self.enqueue(PersistJob::Local {
            key: local_keys::ONBOARDING_DATA,
            value: None,
        });
        if let Some(user_id) = user_id {
            self.enqueue(PersistJob::Remote {
                user_id,
                patch: patch([
                    (metadata_keys::ONBOARDING_COMPLETE, serde_json::json!(false)),
                    (
                        metadata_keys::FREE_USES_REMAINING,
                        serde_json::json!(DEFAULT_FREE_USES),
                    ),
                    (metadata_keys::ONBOARDING_DATA, serde_json::Value::Null),
                    (metadata_keys::ONBOARDING_DATE, serde_json::Value::Null),
                ]),
            });
        }
        self.flush().await;

        info!(mode = %state.identity_mode, "Onboarding reset");
        self.publish(state, TrialPhase::Gated);
    }

    /// Ask subscribers to show the onboarding form.
    pub fn request_onboarding(&self) {
        debug!("Onboarding prompt requested");
        let _ = self.events.send(TrialEvent::ShowOnboarding);
    }

    /// Wait until every queued write has been applied.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.writer.send(PersistJob::Flush(tx)).is_ok() {
            let _ = rx.await;
        }
    }

    /// Reload the state whenever the identity changes.
    pub fn watch_identity(self: &Arc<Self>) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        let mut rx = self.identity.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        info!(?event, "Identity changed, reloading trial state");
                        manager.load_state().await;
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(missed = n, "Identity watcher lagged, reloading trial state");
                        manager.load_state().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("Identity event channel closed");
                        break;
                    }
                }
            }
        })
    }

    async fn set_phase(&self, phase: TrialPhase) {
        let mut inner = self.inner.write().await;
        if !inner.phase.can_transition_to(phase) {
            warn!(from = %inner.phase, to = %phase, "Unexpected trial phase transition");
        }
        inner.phase = phase;
    }

    fn enqueue(&self, job: PersistJob) {
        if self.writer.send(job).is_err() {
            warn!("Trial persistence writer stopped, write dropped");
        }
    }

    fn publish(&self, state: TrialState, phase: TrialPhase) {
        // Ok if nobody is listening
        let _ = self.events.send(TrialEvent::StateChanged { state, phase });
    }
}

fn patch<const N: usize>(
    fields: [(&str, serde_json::Value); N],
) -> serde_json::Map<String, serde_json::Value> {
    fields
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// Apply queued writes in order until the manager is dropped.
async fn run_writer(
    local: Arc<dyn LocalStorage>,
    identity: Arc<dyn IdentityProvider>,
    mut rx: mpsc::UnboundedReceiver<PersistJob>,
) {
    while let Some(job) = rx.recv().await {
        match job {
            PersistJob::Local { key, value } => {
                let result = match value {
                    Some(ref v) => local.set_item(key, v).await,
                    None => local.remove_item(key).await,
                };
                if let Err(e) = result {
                    warn!(key, error = %e, "Failed to persist local trial state");
                }
            }
            PersistJob::Remote { user_id, patch } => {
                if let Err(e) = identity.update_user_metadata(&user_id, patch).await {
                    warn!(user_id = %user_id, error = %e, "Failed to persist trial metadata");
                }
            }
            PersistJob::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("Trial persistence writer stopped");
}
