//! Single-flight token refresh.
//!
//! Only one `/login/refresh` call is ever outstanding. Callers that arrive
//! while a refresh is running park a one-shot receiver in the waiter queue
//! and get the outcome of the running cycle instead of starting their own.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokenwarden_domain::request::{APPLICATION_JSON, CONTENT_TYPE};
use tokenwarden_domain::{ApiRequest, AuthError, AuthResult, TokenPair};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::SessionContext;
use crate::api::endpoints;
use crate::ports::HttpTransport;

/// Result of one refresh cycle, fanned out to every waiter.
#[derive(Debug, Clone)]
enum RefreshOutcome {
    Refreshed(String),
    NoRefreshToken,
    Failed(AuthError),
}

#[derive(Debug, Default)]
enum RefreshState {
    #[default]
    Idle,
    Refreshing {
        waiters: Vec<oneshot::Sender<RefreshOutcome>>,
    },
}

/// Serializes refreshes and shares each result with every concurrent caller.
pub struct RefreshCoordinator {
    context: Arc<SessionContext>,
    transport: Arc<dyn HttpTransport>,
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    /// Creates an idle coordinator.
    #[must_use]
    pub fn new(context: Arc<SessionContext>, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            context,
            transport,
            state: Mutex::new(RefreshState::Idle),
        }
    }

    /// True while a refresh cycle is running.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        matches!(*self.lock_state(), RefreshState::Refreshing { .. })
    }

    /// Obtains a new access token, or joins the refresh already in flight.
    ///
    /// The caller that starts the cycle gets `Ok(Some(token))` on success and
    /// `Ok(None)` when there was no refresh token or the refresh failed; in
    /// the failure case the session has already been ended. Callers that
    /// joined a running cycle see the same token, `Ok(None)`, or
    /// [`AuthError::RefreshFailed`].
    ///
    /// # Errors
    ///
    /// Only joined callers get an error, when the cycle they waited on failed
    /// or was abandoned.
    pub async fn refresh(&self) -> AuthResult<Option<String>> {
        let waiting = {
            let mut state = self.lock_state();
            match &mut *state {
                RefreshState::Refreshing { waiters } => {
                    let (sender, receiver) = oneshot::channel();
                    waiters.push(sender);
                    Some(receiver)
                }
                RefreshState::Idle => {
                    *state = RefreshState::Refreshing {
                        waiters: Vec::new(),
                    };
                    None
                }
            }
        };

        if let Some(receiver) = waiting {
            debug!("Refresh already in flight, waiting for its outcome");
            return match receiver.await {
                Ok(RefreshOutcome::Refreshed(token)) => Ok(Some(token)),
                Ok(RefreshOutcome::NoRefreshToken) => Ok(None),
                Ok(RefreshOutcome::Failed(error)) => Err(AuthError::RefreshFailed {
                    message: error.detail(),
                }),
                Err(_) => Err(AuthError::RefreshFailed {
                    message: "refresh was abandoned".to_string(),
                }),
            };
        }

        let mut cycle = CycleGuard {
            coordinator: self,
            finished: false,
        };
        let outcome = self.run_cycle().await;
        cycle.finish(&outcome);

        match outcome {
            RefreshOutcome::Refreshed(token) => Ok(Some(token)),
            RefreshOutcome::NoRefreshToken | RefreshOutcome::Failed(_) => Ok(None),
        }
    }

    async fn run_cycle(&self) -> RefreshOutcome {
        let Some(refresh_token) = self.context.tokens().refresh_token().await else {
            debug!("No refresh token held, skipping refresh");
            return RefreshOutcome::NoRefreshToken;
        };

        info!("Refreshing access token");
        match self.request_pair(&refresh_token).await {
            Ok(pair) => {
                let access = pair.access_token.clone();
                self.context.set_tokens(pair).await;
                info!("Access token refreshed");
                RefreshOutcome::Refreshed(access)
            }
            Err(error) => {
                warn!(%error, "Token refresh failed, ending session");
                self.context.end_session().await;
                RefreshOutcome::Failed(error)
            }
        }
    }

    async fn request_pair(&self, refresh_token: &str) -> AuthResult<TokenPair> {
        let request = ApiRequest::post(endpoints::LOGIN_REFRESH)
            .header(CONTENT_TYPE, APPLICATION_JSON)
            .bearer(refresh_token);
        let pair: TokenPair = self.transport.send(&request).await?.into_json()?;
        if pair.access_token.is_empty() {
            return Err(AuthError::RefreshFailed {
                message: "refresh response carried no access token".to_string(),
            });
        }
        Ok(pair)
    }

    /// Returns to idle and hands back whoever was waiting.
    fn take_waiters(&self) -> Vec<oneshot::Sender<RefreshOutcome>> {
        match std::mem::take(&mut *self.lock_state()) {
            RefreshState::Refreshing { waiters } => waiters,
            RefreshState::Idle => Vec::new(),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("state", &*self.lock_state())
            .finish_non_exhaustive()
    }
}

/// Ends the cycle even when the initiating future is dropped mid-refresh.
struct CycleGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    finished: bool,
}

impl CycleGuard<'_> {
    fn finish(&mut self, outcome: &RefreshOutcome) {
        self.finished = true;
        let waiters = self.coordinator.take_waiters();
        if !waiters.is_empty() {
            debug!(count = waiters.len(), "Resolving coalesced refresh waiters");
        }
        for waiter in waiters {
            // A waiter that gave up has dropped its receiver.
            let _ = waiter.send(outcome.clone());
        }
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            warn!("Refresh abandoned before completion");
            // Dropping the senders wakes every waiter with a failure.
            drop(self.coordinator.take_waiters());
        }
    }
}
