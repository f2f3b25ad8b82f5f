use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Vendor/admin profile attached to a user account.
/// Mirrors the backend's `UserProfileSerializer` fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub role: String,
    #[serde(default)]
    pub organization_name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Authenticated user snapshot as returned by login and cached locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    /// Backend-computed display name (falls back to organization or email).
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub profile: Option<UserProfile>,
}

impl User {
    pub fn role(&self) -> Option<&str> {
        self.profile.as_ref().map(|p| p.role.as_str())
    }

    pub fn is_verified(&self) -> bool {
        self.profile.as_ref().is_some_and(|p| p.is_verified)
    }
}
