use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::User;

/// Login credentials. The backend authenticates on username, which is the
/// registration email.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// `POST /auth/login/` 200 body. The refresh token never appears here; the
/// server moves it into an httpOnly cookie.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_name: Option<String>,
}

/// `POST /auth/register/` 201 body. Registration does not log the user in.
#[derive(Debug, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
}

/// Error body the backend emits on 4xx: a human-readable `error` plus
/// optional field-level `details` surfaced verbatim to forms.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default)]
    pub details: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_request_omits_empty_organization() {
        let req = RegisterRequest {
            email: "a@b.c".into(),
            password: "hunter22hunter22".into(),
            password_confirm: "hunter22hunter22".into(),
            first_name: "A".into(),
            last_name: "B".into(),
            organization_name: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("organization_name").is_none());
    }

    #[test]
    fn error_body_details_are_optional() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"error": "Invalid credentials."}"#).unwrap();
        assert_eq!(body.error, "Invalid credentials.");
        assert!(body.details.is_none());
    }
}
