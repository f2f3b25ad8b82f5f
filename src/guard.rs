//! Access gating derived from session state. Pure — no I/O, no store reads.

use crate::context::SessionState;

/// Roles the backend assigns to profiles. Vendors submit events; admins
/// moderate them. Unknown role strings pass through for forward
/// compatibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Admin,
    Vendor,
    Custom(String),
}

impl Role {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "admin" => Role::Admin,
            "vendor" => Role::Vendor,
            other => Role::Custom(other.to_string()),
        }
    }
}

/// What the caller should do with the gated surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    /// Authenticated but the role requirement is not met.
    Forbidden,
    /// Not authenticated; `return_to` carries the originally requested path
    /// so navigation can resume after login.
    RedirectToLogin { return_to: String },
}

#[derive(Debug, Clone, Default)]
pub struct AccessGuard {
    required_role: Option<Role>,
}

impl AccessGuard {
    /// Guard that only requires an authenticated session.
    pub fn authenticated() -> Self {
        Self::default()
    }

    /// Guard that additionally requires a role. Admins pass every role
    /// requirement.
    pub fn with_role(role: Role) -> Self {
        Self {
            required_role: Some(role),
        }
    }

    pub fn evaluate(&self, state: &SessionState, requested_path: &str) -> AccessDecision {
        let user = match state.user() {
            Some(user) => user,
            None => {
                return AccessDecision::RedirectToLogin {
                    return_to: requested_path.to_string(),
                }
            }
        };

        match &self.required_role {
            None => AccessDecision::Allow,
            Some(required) => {
                let actual = user.role().map(Role::parse);
                match actual {
                    Some(Role::Admin) => AccessDecision::Allow,
                    Some(role) if role == *required => AccessDecision::Allow,
                    _ => AccessDecision::Forbidden,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{User, UserProfile};

    fn user_with_role(role: &str) -> SessionState {
        SessionState::Authenticated {
            user: User {
                id: 1,
                email: "a@b.c".into(),
                first_name: "A".into(),
                last_name: "B".into(),
                name: "A B".into(),
                profile: Some(UserProfile {
                    id: 1,
                    role: role.into(),
                    organization_name: None,
                    phone_number: None,
                    website: None,
                    bio: None,
                    avatar: None,
                    city: None,
                    country: None,
                    is_verified: true,
                    created_at: None,
                    updated_at: None,
                }),
            },
        }
    }

    #[test]
    fn anonymous_redirects_with_return_path() {
        let decision =
            AccessGuard::authenticated().evaluate(&SessionState::Anonymous, "/dashboard/events");
        assert_eq!(
            decision,
            AccessDecision::RedirectToLogin {
                return_to: "/dashboard/events".into()
            }
        );
    }

    #[test]
    fn authenticated_without_role_requirement_is_allowed() {
        let decision = AccessGuard::authenticated().evaluate(&user_with_role("vendor"), "/");
        assert_eq!(decision, AccessDecision::Allow);
    }

    #[test]
    fn role_mismatch_is_forbidden() {
        let guard = AccessGuard::with_role(Role::Admin);
        assert_eq!(
            guard.evaluate(&user_with_role("vendor"), "/moderation"),
            AccessDecision::Forbidden
        );
    }

    #[test]
    fn admin_passes_any_role_requirement() {
        let guard = AccessGuard::with_role(Role::Vendor);
        assert_eq!(
            guard.evaluate(&user_with_role("admin"), "/dashboard"),
            AccessDecision::Allow
        );
    }

    #[test]
    fn missing_profile_fails_role_requirement() {
        let state = SessionState::Authenticated {
            user: User {
                id: 1,
                email: "a@b.c".into(),
                first_name: String::new(),
                last_name: String::new(),
                name: String::new(),
                profile: None,
            },
        };
        let guard = AccessGuard::with_role(Role::Vendor);
        assert_eq!(guard.evaluate(&state, "/x"), AccessDecision::Forbidden);
    }
}
