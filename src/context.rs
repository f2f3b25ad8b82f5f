//! Process-wide reactive session state.
//!
//! `SessionContext` publishes the current session snapshot on a watch
//! channel and emits navigation intents on an mpsc channel. It is a cached
//! view for rendering; the token store (behind `SessionService`) stays
//! authoritative.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::debug;

use crate::errors::ApiError;
use crate::models::{LoginRequest, RegisterRequest, RegisterResponse, User};
use crate::session::SessionService;

#[derive(Debug, Clone)]
pub enum SessionState {
    Anonymous,
    Authenticated { user: User },
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated { .. })
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Authenticated { user } => Some(user),
            SessionState::Anonymous => None,
        }
    }
}

/// Where the application should go next. Emitted on session-lifecycle
/// transitions only; a stale view after logout is a security bug, which is
/// why these intents live here and not in UI code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Dashboard,
    Login { return_to: Option<String> },
}

/// Handle the request coordinator uses to report a failed refresh episode.
/// Cloneable and cheap; emitting tears the visible session down and issues
/// exactly one navigation intent per call.
#[derive(Clone)]
pub struct SessionEventSink {
    state: Arc<watch::Sender<SessionState>>,
    nav: mpsc::UnboundedSender<Navigation>,
}

impl SessionEventSink {
    pub fn session_expired(&self) {
        debug!("session expired; returning to login");
        self.state.send_replace(SessionState::Anonymous);
        let _ = self.nav.send(Navigation::Login { return_to: None });
    }
}

pub struct SessionContext {
    service: Arc<SessionService>,
    state: Arc<watch::Sender<SessionState>>,
    nav: mpsc::UnboundedSender<Navigation>,
}

impl SessionContext {
    /// Build the context, reconciling persisted state first: a stored but
    /// expired credential triggers exactly one proactive refresh before the
    /// initial snapshot is published, so the first observer sees settled
    /// truth rather than a stale credential.
    pub async fn initialize(
        service: Arc<SessionService>,
    ) -> (
        Self,
        watch::Receiver<SessionState>,
        mpsc::UnboundedReceiver<Navigation>,
    ) {
        if service.access_token().is_some() && service.is_token_expired() {
            debug!("stored credential expired; attempting startup refresh");
            service.refresh_token().await;
        }

        let (state_tx, state_rx) = watch::channel(Self::snapshot_of(&service));
        let (nav_tx, nav_rx) = mpsc::unbounded_channel();
        let context = Self {
            service,
            state: Arc::new(state_tx),
            nav: nav_tx,
        };
        (context, state_rx, nav_rx)
    }

    fn snapshot_of(service: &SessionService) -> SessionState {
        if service.is_authenticated() {
            match service.user() {
                Some(user) => SessionState::Authenticated { user },
                None => SessionState::Anonymous,
            }
        } else {
            SessionState::Anonymous
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Handle for the request coordinator to report terminal auth failures.
    pub fn event_sink(&self) -> SessionEventSink {
        SessionEventSink {
            state: self.state.clone(),
            nav: self.nav.clone(),
        }
    }

    pub async fn login(&self, req: &LoginRequest) -> Result<User, ApiError> {
        let user = self.service.login(req).await?;
        self.state.send_replace(SessionState::Authenticated {
            user: user.clone(),
        });
        let _ = self.nav.send(Navigation::Dashboard);
        Ok(user)
    }

    /// Registration does not establish a session; on success the user is
    /// sent to the login surface to sign in.
    pub async fn register(&self, req: &RegisterRequest) -> Result<RegisterResponse, ApiError> {
        let resp = self.service.register(req).await?;
        let _ = self.nav.send(Navigation::Login { return_to: None });
        Ok(resp)
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        let result = self.service.logout().await;
        self.state.send_replace(SessionState::Anonymous);
        let _ = self.nav.send(Navigation::Login { return_to: None });
        result
    }
}
