//! Session manager: single-flight access token recovery
//!
//! When a request is rejected with 401 the pipeline asks the manager for a
//! usable access token. The first caller becomes the leader and runs the
//! refresh; callers arriving while it is in flight are parked on a one-shot
//! channel and receive the leader's outcome in arrival order. Any refresh
//! failure ends the session: stored credentials are cleared and the
//! session-expired hook fires.

use super::store::SessionStore;
use crate::types::RefreshResponse;
use async_trait::async_trait;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Why a session could not be recovered
///
/// Cloned to every queued caller, so it carries strings rather than the
/// underlying transport error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("No refresh token is stored")]
    MissingRefreshToken,

    #[error("Invalid refresh response: {0}")]
    InvalidRefreshResponse(String),

    #[error("Refresh rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Refresh request failed: {0}")]
    Transport(String),

    #[error("Could not persist refreshed tokens: {0}")]
    Store(String),

    #[error("Refresh was abandoned before it completed")]
    Abandoned,
}

/// Calls the backend token refresh endpoint
#[cfg_attr(test, mockall::automock)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, SessionError>;
}

/// Invoked once per terminated session; the console uses it to route back to login
pub type SessionExpiredHook = Arc<dyn Fn(&SessionError) + Send + Sync>;

type Waiter = oneshot::Sender<Result<String, SessionError>>;

enum RefreshState {
    Idle,
    Refreshing(Vec<Waiter>),
}

enum Role {
    Leader,
    Waiter(oneshot::Receiver<Result<String, SessionError>>),
    AlreadyRotated(String),
}

/// Owns the refresh state for one client and every clone of it
pub struct SessionManager {
    store: SessionStore,
    refresher: Arc<dyn TokenRefresher>,
    state: Mutex<RefreshState>,
    on_expired: Option<SessionExpiredHook>,
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("store", &self.store)
            .field("refreshing", &self.is_refreshing())
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    pub fn new(store: SessionStore, refresher: Arc<dyn TokenRefresher>) -> Self {
        Self {
            store,
            refresher,
            state: Mutex::new(RefreshState::Idle),
            on_expired: None,
        }
    }

    /// Register the hook fired when a refresh fails
    #[must_use]
    pub fn with_expired_hook(mut self, hook: SessionExpiredHook) -> Self {
        self.on_expired = Some(hook);
        self
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn is_refreshing(&self) -> bool {
        matches!(*self.lock_state(), RefreshState::Refreshing(_))
    }

    /// Number of callers parked behind the in-flight refresh
    pub fn pending(&self) -> usize {
        match &*self.lock_state() {
            RefreshState::Refreshing(waiters) => waiters.len(),
            RefreshState::Idle => 0,
        }
    }

    /// Obtain a usable access token after `stale` was rejected by the backend
    ///
    /// If the stored token already differs from `stale`, another caller has
    /// rotated it and it is returned without a network call. Otherwise this
    /// call either leads a refresh or waits for the one in flight.
    pub async fn recover_access_token(&self, stale: Option<&str>) -> Result<String, SessionError> {
        match self.join(stale) {
            Role::AlreadyRotated(token) => {
                debug!("access token already rotated, reusing stored token");
                Ok(token)
            }
            Role::Waiter(receiver) => {
                debug!("refresh in flight, request queued");
                receiver.await.unwrap_or(Err(SessionError::Abandoned))
            }
            Role::Leader => {
                let flight = InFlight::new(self);
                let result = self.run_refresh().await;
                flight.settle(&result);
                result
            }
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn join(&self, stale: Option<&str>) -> Role {
        let mut state = self.lock_state();

        if let RefreshState::Refreshing(waiters) = &mut *state {
            let (sender, receiver) = oneshot::channel();
            waiters.push(sender);
            return Role::Waiter(receiver);
        }

        if let Some(current) = self.store.access_token()
            && stale != Some(current.as_str())
        {
            return Role::AlreadyRotated(current);
        }

        *state = RefreshState::Refreshing(Vec::new());
        Role::Leader
    }

    async fn run_refresh(&self) -> Result<String, SessionError> {
        let result = self.try_refresh().await;
        if let Err(error) = &result {
            self.expire(error);
        }
        result
    }

    async fn try_refresh(&self) -> Result<String, SessionError> {
        let refresh_token = self
            .store
            .refresh_token()
            .ok_or(SessionError::MissingRefreshToken)?;

        let pair = self.refresher.refresh(&refresh_token).await?.into_pair()?;

        self.store
            .store_tokens(&pair)
            .map_err(|e| SessionError::Store(e.to_string()))?;

        info!("access token refreshed");
        Ok(pair.access_token)
    }

    fn expire(&self, error: &SessionError) {
        warn!(error = %error, "token refresh failed, ending session");
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "failed to clear stored credentials");
        }
        if let Some(hook) = &self.on_expired {
            hook(error);
        }
    }

    fn settle(&self, result: &Result<String, SessionError>) {
        let waiters = match std::mem::replace(&mut *self.lock_state(), RefreshState::Idle) {
            RefreshState::Refreshing(waiters) => waiters,
            RefreshState::Idle => Vec::new(),
        };

        if !waiters.is_empty() {
            debug!(waiters = waiters.len(), ok = result.is_ok(), "draining refresh queue");
        }
        for waiter in waiters {
            // A dropped receiver means the caller gave up while queued.
            let _ = waiter.send(result.clone());
        }
    }
}

/// Drains the queue if the leading future is dropped before settling
struct InFlight<'a> {
    manager: &'a SessionManager,
    settled: bool,
}

impl<'a> InFlight<'a> {
    fn new(manager: &'a SessionManager) -> Self {
        Self {
            manager,
            settled: false,
        }
    }

    fn settle(mut self, result: &Result<String, SessionError>) {
        self.settled = true;
        self.manager.settle(result);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("token refresh abandoned by its caller");
            self.manager.settle(&Err(SessionError::Abandoned));
        }
    }
}
