//! Culturalite API client.
//!
//! Owns the authenticated-session machinery for the Culturalite events
//! platform: credential persistence (`store`), unverified JWT expiry
//! inspection (`token`), the session lifecycle (`session`), the
//! single-flight refresh-and-replay request coordinator (`client`), the
//! reactive session snapshot (`context`), and role-based access gating
//! (`guard`).

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

pub mod client;
pub mod config;
pub mod context;
pub mod errors;
pub mod guard;
pub mod models;
pub mod retry;
pub mod session;
pub mod store;
pub mod token;

pub use client::{ApiClient, RequestOptions};
pub use config::{ClientConfig, ConfigError};
pub use context::{Navigation, SessionContext, SessionState};
pub use errors::ApiError;
pub use guard::{AccessDecision, AccessGuard, Role};
pub use session::SessionService;
pub use store::{FileStore, MemoryStore, StoreError, TokenStore};

/// Fully wired client: one shared HTTP client (and cookie jar), one
/// `SessionService`, a reconciled `SessionContext`, and an `ApiClient`
/// hooked to the context's event sink.
pub struct Culturalite {
    pub api: ApiClient,
    pub session: SessionContext,
    pub state: watch::Receiver<SessionState>,
    pub navigation: mpsc::UnboundedReceiver<Navigation>,
}

impl Culturalite {
    pub async fn connect(
        config: ClientConfig,
        store: Arc<dyn TokenStore>,
    ) -> Result<Self, ConfigError> {
        let http = config.build_http_client()?;
        let service = Arc::new(SessionService::new(&config, http.clone(), store));
        let (session, state, navigation) = SessionContext::initialize(Arc::clone(&service)).await;
        let api = ApiClient::new(&config, http, service).with_event_sink(session.event_sink());
        Ok(Self {
            api,
            session,
            state,
            navigation,
        })
    }
}
