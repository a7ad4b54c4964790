use crate::handlers::auth;
use crate::handlers::session_controller::{LOGIN_ROUTE, UNAUTHORIZED_ROUTE};
use crate::handlers::store::{clear_session_keys, TokenStore, AUTH_TOKEN, USER_ROLE};
use crate::models::all_models::Role;
use chrono::{DateTime, Utc};
use log::debug;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    RedirectLogin,
    RedirectUnauthorized,
}

impl Decision {
    pub fn redirect_target(self) -> Option<&'static str> {
        match self {
            Decision::Allow => None,
            Decision::RedirectLogin => Some(LOGIN_ROUTE),
            Decision::RedirectUnauthorized => Some(UNAUTHORIZED_ROUTE),
        }
    }
}

/// Pure decision over a token, a role and a whitelist. Expiry is checked
/// before the role so an expired admin still lands on the login page.
pub fn decide(
    token: Option<&str>,
    role: Option<&str>,
    allowed_roles: &[Role],
    now: DateTime<Utc>,
) -> Decision {
    if !auth::is_valid_at(token, now) {
        return Decision::RedirectLogin;
    }
    match role.and_then(|r| Role::from_str(r).ok()) {
        Some(role) if allowed_roles.contains(&role) => Decision::Allow,
        _ => Decision::RedirectUnauthorized,
    }
}

pub fn can_access<S: TokenStore + ?Sized>(store: &S, allowed_roles: &[Role]) -> Decision {
    can_access_at(store, allowed_roles, Utc::now())
}

/// Reads the stored session and decides. An invalid token wipes every
/// session key; a role mismatch leaves the session untouched.
pub fn can_access_at<S: TokenStore + ?Sized>(
    store: &S,
    allowed_roles: &[Role],
    now: DateTime<Utc>,
) -> Decision {
    let token = store.get(AUTH_TOKEN);
    let role = store.get(USER_ROLE);
    let decision = decide(token.as_deref(), role.as_deref(), allowed_roles, now);
    if decision == Decision::RedirectLogin {
        debug!("Stored token missing or expired, clearing session");
        clear_session_keys(store);
    }
    decision
}
