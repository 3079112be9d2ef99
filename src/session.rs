use crate::availability::{
    Availability, AvailabilityCounts, Classification, Endpoints, load_availability,
};
use crate::date_key::DateKey;
use crate::errors::InitializationFailure;
use crate::fetcher::{JsonSource, RetryPolicy};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionPhase {
    Uninitialized,
    Loading,
    Ready,
    Failed,
}

#[derive(Debug, Clone)]
enum SessionState {
    Uninitialized,
    Loading,
    Ready(Arc<Availability>),
    Failed(InitializationFailure),
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub state: SessionPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counts: Option<AvailabilityCounts>,
}

/// One opening of the booking calendar.
///
/// Availability is loaded at most once per session. `Ready` and `Failed` are
/// terminal; start a new session with [`CalendarSession::fresh`] to load again.
///
/// The load runs on its own task, so a caller that stops waiting does not
/// leave the session stuck in `Loading`.
pub struct CalendarSession<S> {
    source: Arc<S>,
    endpoints: Endpoints,
    policy: RetryPolicy,
    state: Arc<RwLock<SessionState>>,
    init: Arc<Mutex<()>>,
}

impl<S: JsonSource + 'static> CalendarSession<S> {
    pub fn new(source: Arc<S>, endpoints: Endpoints, policy: RetryPolicy) -> Self {
        Self {
            source,
            endpoints,
            policy,
            state: Arc::new(RwLock::new(SessionState::Uninitialized)),
            init: Arc::new(Mutex::new(())),
        }
    }

    /// A new, uninitialized session against the same feeds.
    pub fn fresh(&self) -> Self {
        Self::new(Arc::clone(&self.source), self.endpoints.clone(), self.policy)
    }

    pub async fn phase(&self) -> SessionPhase {
        match &*self.state.read().await {
            SessionState::Uninitialized => SessionPhase::Uninitialized,
            SessionState::Loading => SessionPhase::Loading,
            SessionState::Ready(_) => SessionPhase::Ready,
            SessionState::Failed(_) => SessionPhase::Failed,
        }
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        match &*self.state.read().await {
            SessionState::Uninitialized => SessionSnapshot::bare(SessionPhase::Uninitialized),
            SessionState::Loading => SessionSnapshot::bare(SessionPhase::Loading),
            SessionState::Ready(availability) => SessionSnapshot {
                state: SessionPhase::Ready,
                error: None,
                counts: Some(availability.counts()),
            },
            SessionState::Failed(err) => SessionSnapshot {
                state: SessionPhase::Failed,
                error: Some(err.to_string()),
                counts: None,
            },
        }
    }

    /// Loads both feeds the first time it is called.
    ///
    /// Later calls, including ones racing the first, return the settled
    /// outcome without touching the network.
    pub async fn initialize(&self) -> Result<Arc<Availability>, InitializationFailure> {
        let init = Arc::clone(&self.init).lock_owned().await;

        match &*self.state.read().await {
            SessionState::Ready(availability) => {
                debug!("calendar session already ready");
                return Ok(Arc::clone(availability));
            }
            SessionState::Failed(err) => return Err(err.clone()),
            SessionState::Uninitialized | SessionState::Loading => {}
        }

        *self.state.write().await = SessionState::Loading;
        info!(
            "loading calendar availability from {} and {}",
            self.endpoints.application_dates, self.endpoints.open_windows
        );

        let source = Arc::clone(&self.source);
        let endpoints = self.endpoints.clone();
        let policy = self.policy;
        let state = Arc::clone(&self.state);

        let load = tokio::spawn(async move {
            // Held until the outcome is recorded so later callers see it.
            let _init = init;
            let outcome = load_availability(source.as_ref(), &endpoints, policy)
                .await
                .map(Arc::new);

            *state.write().await = match &outcome {
                Ok(availability) => {
                    info!("calendar availability ready: {:?}", availability.counts());
                    SessionState::Ready(Arc::clone(availability))
                }
                Err(err) => {
                    warn!("calendar availability failed: {err}");
                    SessionState::Failed(err.clone())
                }
            };

            outcome
        });

        match load.await {
            Ok(outcome) => outcome,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            // Spawned tasks are only cancelled when the runtime shuts down.
            Err(err) => unreachable!("calendar load task cancelled: {err}"),
        }
    }

    pub async fn availability(&self) -> Option<Arc<Availability>> {
        match &*self.state.read().await {
            SessionState::Ready(availability) => Some(Arc::clone(availability)),
            _ => None,
        }
    }

    /// `None` until the session is ready.
    pub async fn classify(&self, date: DateKey) -> Option<Classification> {
        self.availability()
            .await
            .map(|availability| availability.classify(date))
    }
}

impl SessionSnapshot {
    fn bare(state: SessionPhase) -> Self {
        Self {
            state,
            error: None,
            counts: None,
        }
    }
}
