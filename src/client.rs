//! Authenticated request coordinator.
//!
//! Every outbound API call goes through `ApiClient::request`: it attaches
//! the bearer credential, watches for 401, and funnels concurrent expiry
//! into one shared refresh episode (`SessionService::begin_or_join_refresh`).
//! A replayed request that still 401s is terminal for that call — there is
//! never a second refresh inside one episode.

use std::sync::Arc;

use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::context::SessionEventSink;
use crate::errors::ApiError;
use crate::session::SessionService;

/// Per-request knobs. `require_auth` short-circuits to the refresh path when
/// no credential is present; `retry_on_unauthorized` opts a call out of the
/// refresh-and-replay protocol entirely (the auth endpoints themselves use
/// their own plain client for exactly that reason).
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Value>,
    pub require_auth: bool,
    pub retry_on_unauthorized: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: HeaderMap::new(),
            body: None,
            require_auth: true,
            retry_on_unauthorized: true,
        }
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(body: Value) -> Self {
        Self {
            method: Method::POST,
            body: Some(body),
            ..Self::default()
        }
    }

    pub fn put(body: Value) -> Self {
        Self {
            method: Method::PUT,
            body: Some(body),
            ..Self::default()
        }
    }

    pub fn delete() -> Self {
        Self {
            method: Method::DELETE,
            ..Self::default()
        }
    }
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionService>,
    events: Option<SessionEventSink>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, http: reqwest::Client, session: Arc<SessionService>) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
            events: None,
        }
    }

    /// Wire in the sink that receives the navigate-to-login signal when a
    /// refresh episode fails.
    pub fn with_event_sink(mut self, events: SessionEventSink) -> Self {
        self.events = Some(events);
        self
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        self.request(endpoint, RequestOptions::get()).await
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: Value,
    ) -> Result<T, ApiError> {
        self.request(endpoint, RequestOptions::post(body)).await
    }

    /// Issue one API call under the coordinator's state machine.
    ///
    /// Fast path: credential attached, response decoded, non-401 failures
    /// classified as-is. A 401 (or `require_auth` with no credential) joins
    /// or starts the single refresh episode and replays once on success.
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        opts: RequestOptions,
    ) -> Result<T, ApiError> {
        let token = self.session.try_access_token()?;

        if opts.require_auth && token.is_none() {
            if !opts.retry_on_unauthorized {
                return Err(ApiError::AuthenticationExpired);
            }
            debug!(endpoint, "no credential present; entering refresh gate");
            return self.refresh_and_replay(endpoint, &opts).await;
        }

        let resp = self.send(endpoint, &opts, token.as_deref()).await?;
        if resp.status() == StatusCode::UNAUTHORIZED && opts.retry_on_unauthorized {
            debug!(endpoint, "request unauthorized; entering refresh gate");
            return self.refresh_and_replay(endpoint, &opts).await;
        }

        Self::decode(resp).await
    }

    /// One pass through the refresh gate plus at most one replay. The
    /// episode leader alone emits the session-expired signal, so N rejected
    /// callers produce a single navigation intent.
    async fn refresh_and_replay<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        opts: &RequestOptions,
    ) -> Result<T, ApiError> {
        let outcome = self.session.begin_or_join_refresh().await;

        if !outcome.refreshed {
            if outcome.led {
                if let Some(events) = &self.events {
                    events.session_expired();
                }
            }
            return Err(ApiError::AuthenticationExpired);
        }

        let token = self.session.try_access_token()?;
        let resp = self.send(endpoint, opts, token.as_deref()).await?;
        if resp.status() == StatusCode::UNAUTHORIZED {
            // the server rejected a freshly issued credential; retrying
            // cannot help this call
            warn!(endpoint, "replayed request still unauthorized");
            return Err(ApiError::SessionExpired);
        }

        Self::decode(resp).await
    }

    async fn send(
        &self,
        endpoint: &str,
        opts: &RequestOptions,
        token: Option<&str>,
    ) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut req = self
            .http
            .request(opts.method.clone(), url)
            .headers(opts.headers.clone());
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = &opts.body {
            req = req.json(body);
        }
        req.send().await.map_err(ApiError::network)
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
        if !resp.status().is_success() {
            return Err(ApiError::from_response(resp).await);
        }
        resp.json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}
