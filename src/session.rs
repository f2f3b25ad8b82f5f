//! Session lifecycle: register, login, logout, token refresh.
//!
//! `SessionService` is the only component that reads or writes the token
//! store, and it owns the one `RefreshEpisode` slot for the process. The
//! single-flight guarantee lives in `begin_or_join_refresh`; callers (the
//! request coordinator) never touch the episode directly.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, error, warn};

use crate::config::ClientConfig;
use crate::errors::ApiError;
use crate::models::{
    LoginRequest, LoginResponse, RefreshResponse, RegisterRequest, RegisterResponse, User,
};
use crate::store::{StoreKeys, TokenStore};
use crate::token;

/// Outcome of one pass through the refresh gate. `led` is true for the
/// caller that actually performed the network call; only that caller emits
/// the session-expired signal, so N rejected waiters produce one navigation.
#[derive(Debug, Clone, Copy)]
pub struct RefreshOutcome {
    pub refreshed: bool,
    pub led: bool,
}

/// One coordinated refresh-and-replay cycle. Exists only while the refresh
/// network call is in flight; the waiters are settled in FIFO order the
/// moment it resolves.
#[derive(Default)]
struct RefreshEpisode {
    waiters: Vec<oneshot::Sender<bool>>,
}

pub struct SessionService {
    http: reqwest::Client,
    base_url: String,
    store: Arc<dyn TokenStore>,
    keys: StoreKeys,
    refresh_timeout: Duration,
    episode: Mutex<Option<RefreshEpisode>>,
}

impl SessionService {
    pub fn new(config: &ClientConfig, http: reqwest::Client, store: Arc<dyn TokenStore>) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            store,
            keys: StoreKeys::with_prefix(&config.storage_prefix),
            refresh_timeout: config.refresh_timeout(),
            episode: Mutex::new(None),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ── Account operations ───────────────────────────────────

    /// Register a new vendor account. Does not log the user in and never
    /// touches the store. 4xx bodies are surfaced verbatim so forms can show
    /// field-level detail; anything else collapses to `RegistrationFailed`.
    pub async fn register(&self, req: &RegisterRequest) -> Result<RegisterResponse, ApiError> {
        let resp = self
            .http
            .post(self.url("/auth/register/"))
            .json(req)
            .send()
            .await
            .map_err(|e| {
                warn!("registration request failed: {e}");
                ApiError::RegistrationFailed
            })?;

        let status = resp.status();
        if status.is_success() {
            resp.json::<RegisterResponse>().await.map_err(|e| {
                warn!("registration response unreadable: {e}");
                ApiError::RegistrationFailed
            })
        } else {
            Err(ApiError::from_response(resp).await)
        }
    }

    /// Log in and establish the session. The credential and the user
    /// snapshot are written together: if the snapshot write fails, the
    /// credential is rolled back so the store never holds a token without a
    /// user.
    pub async fn login(&self, req: &LoginRequest) -> Result<User, ApiError> {
        let resp = self
            .http
            .post(self.url("/auth/login/"))
            .json(req)
            .send()
            .await
            .map_err(ApiError::network)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::from_response(resp).await);
        }

        let body: LoginResponse = resp
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;

        self.store.set(&self.keys.access_token, &body.access)?;
        let snapshot = serde_json::to_string(&body.user)?;
        if let Err(e) = self.store.set(&self.keys.user, &snapshot) {
            let _ = self.store.remove(&self.keys.access_token);
            return Err(e.into());
        }

        debug!(user_id = body.user.id, "session established");
        Ok(body.user)
    }

    /// End the session. The store is cleared *before* the revocation call so
    /// neither cancellation nor an unreachable server can leave stale
    /// credentials behind; the network call is best-effort.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let token = self.store.get(&self.keys.access_token).ok().flatten();
        let cleared = self.clear_session();

        if let Some(token) = token {
            match self
                .http
                .post(self.url("/auth/logout/"))
                .bearer_auth(&token)
                .send()
                .await
            {
                Ok(resp) if !resp.status().is_success() => {
                    warn!(status = resp.status().as_u16(), "server-side logout rejected");
                }
                Err(e) => warn!("server-side logout failed: {e}"),
                Ok(_) => {}
            }
        }

        cleared
    }

    // ── Token refresh ────────────────────────────────────────

    /// One refresh attempt against `/auth/refresh/`. The refresh credential
    /// travels in the cookie jar; the request body is empty. Zero retries: a
    /// failed refresh is final and clears the whole session.
    ///
    /// Not reentrant-safe on its own — concurrent callers must go through
    /// `begin_or_join_refresh`.
    pub async fn refresh_token(&self) -> bool {
        let result = self
            .http
            .post(self.url("/auth/refresh/"))
            .timeout(self.refresh_timeout)
            .send()
            .await;

        let resp = match result {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                warn!(status = resp.status().as_u16(), "token refresh rejected");
                self.clear_session_best_effort();
                return false;
            }
            Err(e) => {
                warn!("token refresh failed: {e}");
                self.clear_session_best_effort();
                return false;
            }
        };

        match resp.json::<RefreshResponse>().await {
            Ok(body) => match self.store.set(&self.keys.access_token, &body.access) {
                Ok(()) => {
                    debug!("access token refreshed");
                    true
                }
                Err(e) => {
                    error!("could not persist refreshed token: {e}");
                    self.clear_session_best_effort();
                    false
                }
            },
            Err(e) => {
                warn!("token refresh response unreadable: {e}");
                self.clear_session_best_effort();
                false
            }
        }
    }

    /// The single-flight gate. The first caller while the slot is idle
    /// installs the episode and runs the refresh; every caller that arrives
    /// before it settles gets a queued oneshot instead of a second network
    /// call. The episode flag is set under the lock, before any await, so
    /// two tasks can never both observe an idle slot.
    pub async fn begin_or_join_refresh(&self) -> RefreshOutcome {
        let waiter = {
            let mut slot = self.lock_episode();
            match slot.as_mut() {
                Some(episode) => {
                    let (tx, rx) = oneshot::channel();
                    episode.waiters.push(tx);
                    Some(rx)
                }
                None => {
                    *slot = Some(RefreshEpisode::default());
                    None
                }
            }
        };

        match waiter {
            Some(rx) => RefreshOutcome {
                // a dropped leader settles the episode as failed via its
                // guard, so a closed channel reads as failure too
                refreshed: rx.await.unwrap_or(false),
                led: false,
            },
            None => {
                let guard = EpisodeGuard { service: self };
                let refreshed = self.refresh_token().await;
                guard.settle(refreshed);
                RefreshOutcome {
                    refreshed,
                    led: true,
                }
            }
        }
    }

    /// Destroy the episode and resolve every waiter, in the order they
    /// joined. Waiters whose callers were dropped simply fail the send.
    fn settle_episode(&self, refreshed: bool) {
        let waiters = self
            .lock_episode()
            .take()
            .map(|e| e.waiters)
            .unwrap_or_default();
        for tx in waiters {
            let _ = tx.send(refreshed);
        }
    }

    fn lock_episode(&self) -> MutexGuard<'_, Option<RefreshEpisode>> {
        self.episode.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ── Read accessors ───────────────────────────────────────

    /// True iff the store holds both a credential and a user snapshot and
    /// the credential is not locally expired. The server still has the last
    /// word: a 401 overrides a local "not expired" verdict.
    pub fn is_authenticated(&self) -> bool {
        match (self.access_token(), self.user()) {
            (Some(token), Some(_)) => !token::is_expired(&token),
            _ => false,
        }
    }

    pub fn is_token_expired(&self) -> bool {
        match self.access_token() {
            Some(token) => token::is_expired(&token),
            None => true,
        }
    }

    /// Store-error-aware credential read for the coordinator: a storage
    /// outage must surface as `Storage`, not masquerade as a missing
    /// credential and turn into a bogus auth failure.
    pub fn try_access_token(&self) -> Result<Option<String>, ApiError> {
        Ok(self.store.get(&self.keys.access_token)?)
    }

    pub fn access_token(&self) -> Option<String> {
        match self.try_access_token() {
            Ok(value) => value,
            Err(e) => {
                error!("token store read failed: {e}");
                None
            }
        }
    }

    pub fn user(&self) -> Option<User> {
        let raw = match self.store.get(&self.keys.user) {
            Ok(value) => value?,
            Err(e) => {
                error!("token store read failed: {e}");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!("cached user snapshot unreadable: {e}");
                None
            }
        }
    }

    fn clear_session(&self) -> Result<(), ApiError> {
        self.store.remove(&self.keys.access_token)?;
        self.store.remove(&self.keys.user)?;
        Ok(())
    }

    fn clear_session_best_effort(&self) {
        if let Err(e) = self.clear_session() {
            error!("failed to clear session: {e}");
        }
    }
}

/// Settles the episode as failed if the leading future is dropped before
/// the refresh resolves, so queued waiters cannot wedge.
struct EpisodeGuard<'a> {
    service: &'a SessionService,
}

impl EpisodeGuard<'_> {
    fn settle(self, refreshed: bool) {
        self.service.settle_episode(refreshed);
        std::mem::forget(self);
    }
}

impl Drop for EpisodeGuard<'_> {
    fn drop(&mut self) {
        self.service.settle_episode(false);
    }
}
