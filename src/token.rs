//! Unverified JWT expiry inspection.
//!
//! The client decodes the token payload purely to *hint* at expiry for UX
//! and proactive refresh. Signatures are never checked here — the server is
//! the sole authority on validity, and a 401 from it always overrides a
//! local "not yet expired" verdict.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token is not a three-part JWT")]
    Malformed,
    #[error("token payload is not valid base64/JSON")]
    UndecodablePayload,
    #[error("token has no numeric exp claim")]
    MissingExp,
}

#[derive(Deserialize)]
struct ExpClaim {
    exp: Option<i64>,
}

/// Decode the `exp` claim (epoch seconds) from the payload segment.
pub fn decode_expiry(token: &str) -> Result<i64, TokenError> {
    let mut parts = token.split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return Err(TokenError::Malformed),
    };

    let raw = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| TokenError::UndecodablePayload)?;
    let claims: ExpClaim =
        serde_json::from_slice(&raw).map_err(|_| TokenError::UndecodablePayload)?;

    claims.exp.ok_or(TokenError::MissingExp)
}

/// Fail-closed expiry check against an explicit clock. Malformed or
/// unparsable tokens count as expired; this never errors back to the caller.
pub fn is_expired_at(token: &str, now_epoch: i64) -> bool {
    match decode_expiry(token) {
        Ok(exp) => exp <= now_epoch,
        Err(_) => true,
    }
}

/// Fail-closed expiry check against the wall clock.
pub fn is_expired(token: &str) -> bool {
    is_expired_at(token, chrono::Utc::now().timestamp())
}
