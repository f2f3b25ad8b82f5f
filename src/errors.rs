use serde_json::Value;
use thiserror::Error;

use crate::store::StoreError;

/// Error taxonomy for everything that can go wrong between the caller and the
/// Culturalite API. Each variant maps to a distinct recovery policy: only
/// `Validation` carries remote detail worth showing in a form, and only
/// `AuthenticationExpired` tears the session down.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure: DNS, connect, TLS, timeout. No response was
    /// received, so there is nothing remote to surface.
    #[error("network failure: {0}")]
    Network(String),

    /// The refresh episode failed or was rejected. The local session has been
    /// cleared by the time this is returned.
    #[error("authentication expired")]
    AuthenticationExpired,

    /// A replayed request still got a 401 after a successful refresh.
    /// Terminal for that one call; never triggers a second refresh.
    #[error("session expired")]
    SessionExpired,

    /// The persistence medium is inaccessible. Fatal to session
    /// establishment; never silently collapsed into "not logged in".
    #[error(transparent)]
    Storage(#[from] StoreError),

    /// Remote 4xx with the backend's `{error, details}` body surfaced
    /// verbatim for login/register forms.
    #[error("{error}")]
    Validation {
        status: u16,
        error: String,
        details: Option<Value>,
    },

    /// Registration could not complete for a non-4xx reason (transport or
    /// parse failure). The remote message, if any, was not usable.
    #[error("registration failed")]
    RegistrationFailed,

    /// Remote 5xx. The body is kept for logging; callers outside this crate
    /// may retry with backoff (see `retry`), the coordinator never does.
    #[error("upstream error ({status}): {body}")]
    Upstream { status: u16, body: String },

    /// A 2xx response whose body did not match the expected shape.
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Map a reqwest transport error. Responses with error statuses never
    /// take this path; those are classified from the status code instead.
    pub fn network(err: reqwest::Error) -> Self {
        ApiError::Network(err.to_string())
    }

    /// Classify a non-2xx response: 4xx becomes `Validation` with the
    /// backend's `{error, details}` body verbatim, 5xx becomes `Upstream`.
    pub(crate) async fn from_response(resp: reqwest::Response) -> Self {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        if (400..500).contains(&status) {
            match serde_json::from_str::<crate::models::ErrorBody>(&body) {
                Ok(parsed) => ApiError::Validation {
                    status,
                    error: parsed.error,
                    details: parsed.details,
                },
                Err(_) => ApiError::Validation {
                    status,
                    error: format!("request failed with status {status}"),
                    details: None,
                },
            }
        } else {
            ApiError::Upstream { status, body }
        }
    }

    /// True for the two terminal auth failures that mean "log in again".
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            ApiError::AuthenticationExpired | ApiError::SessionExpired
        )
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}
