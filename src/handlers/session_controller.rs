use crate::errors::StoreError;
use crate::handlers::auth::{self, DEFAULT_USER_EMAIL, DEFAULT_USER_NAME};
use crate::handlers::store::{
    clear_session_keys, TokenStore, AUTH_TOKEN, REQUIRES_CUSTOMER_PROFILE, USER_EMAIL, USER_NAME,
    USER_ROLE, USER_TYPE_ID,
};
use crate::models::all_models::{Role, Session};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::str::FromStr;

pub const LOGIN_ROUTE: &str = "/login";
pub const UNAUTHORIZED_ROUTE: &str = "/unauthorized";
pub const ADMIN_DASHBOARD_ROUTE: &str = "/dashboard";
pub const CLERK_DASHBOARD_ROUTE: &str = "/clerk/dashboard";
pub const CUSTOMER_DASHBOARD_ROUTE: &str = "/customer/dashboard";
pub const PROFILE_COMPLETION_ROUTE: &str = "/customer/complete-profile";

#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    Unauthenticated,
    Authenticated(Session),
}

/// Owns the authentication state for one visitor and writes every
/// transition through to the backing store.
pub struct SessionController<'a, S: TokenStore + ?Sized> {
    store: &'a S,
    state: AuthState,
}

impl<'a, S: TokenStore + ?Sized> SessionController<'a, S> {
    pub fn initialize(store: &'a S) -> Self {
        Self::initialize_at(store, Utc::now())
    }

    /// Rehydrates from the store. Anything short of a valid token plus a
    /// known role ends in a full logout.
    pub fn initialize_at(store: &'a S, now: DateTime<Utc>) -> Self {
        let mut controller = SessionController {
            store,
            state: AuthState::Unauthenticated,
        };

        let token = store.get(AUTH_TOKEN);
        let role = store
            .get(USER_ROLE)
            .and_then(|r| Role::from_str(&r).ok());

        match (token, role) {
            (Some(token), Some(role)) if auth::is_valid_at(Some(&token), now) => {
                let claims = auth::decode(&token).ok();
                let user_type_id = store
                    .get(USER_TYPE_ID)
                    .and_then(|v| v.parse().ok())
                    .or_else(|| claims.as_ref().and_then(|c| c.user_type_id()))
                    .unwrap_or(0);
                let session = Session {
                    token,
                    role,
                    user_type_id,
                    user_name: store.get(USER_NAME).unwrap_or_else(|| {
                        claims
                            .as_ref()
                            .map_or_else(|| DEFAULT_USER_NAME.to_string(), |c| c.user_name())
                    }),
                    user_email: store.get(USER_EMAIL).unwrap_or_else(|| {
                        claims
                            .as_ref()
                            .map_or_else(|| DEFAULT_USER_EMAIL.to_string(), |c| c.user_email())
                    }),
                    requires_profile_completion: store
                        .get(REQUIRES_CUSTOMER_PROFILE)
                        .is_some_and(|v| v == "true"),
                };
                let incomplete = [USER_TYPE_ID, USER_NAME, USER_EMAIL, REQUIRES_CUSTOMER_PROFILE]
                    .iter()
                    .any(|key| store.get(key).is_none());
                if incomplete {
                    if let Err(e) = controller.write_through(&session) {
                        warn!("Could not restore session defaults, logging out: {}", e);
                        controller.logout();
                        return controller;
                    }
                }
                debug!("Rehydrated session for {} ({})", session.user_name, role);
                controller.state = AuthState::Authenticated(session);
            }
            _ => {
                controller.logout();
            }
        }

        controller
    }

    /// Establishes a session from a login or registration response. A token
    /// whose payload cannot be decoded still logs in, with placeholder
    /// identity fields.
    pub fn login(
        &mut self,
        user_type_id: i64,
        token: &str,
        role: Role,
        requires_profile_completion: bool,
    ) -> Result<&Session, StoreError> {
        let (user_name, user_email) = match auth::decode(token) {
            Ok(claims) => (claims.user_name(), claims.user_email()),
            Err(e) => {
                warn!("Could not decode token payload at login: {}", e);
                (DEFAULT_USER_NAME.to_string(), DEFAULT_USER_EMAIL.to_string())
            }
        };

        let session = Session {
            token: token.to_string(),
            role,
            user_type_id,
            user_name,
            user_email,
            requires_profile_completion,
        };

        if let Err(e) = self.write_through(&session) {
            warn!("Session write failed, logging out: {}", e);
            self.logout();
            return Err(e);
        }

        info!("Session established for {} as {}", session.user_name, role);
        self.state = AuthState::Authenticated(session);
        match &self.state {
            AuthState::Authenticated(session) => Ok(session),
            AuthState::Unauthenticated => Err(StoreError("session vanished".into())),
        }
    }

    fn write_through(&self, session: &Session) -> Result<(), StoreError> {
        self.store.set(AUTH_TOKEN, &session.token)?;
        self.store.set(USER_ROLE, &session.role.to_string())?;
        self.store
            .set(USER_TYPE_ID, &session.user_type_id.to_string())?;
        self.store.set(
            REQUIRES_CUSTOMER_PROFILE,
            if session.requires_profile_completion {
                "true"
            } else {
                "false"
            },
        )?;
        self.store.set(USER_NAME, &session.user_name)?;
        self.store.set(USER_EMAIL, &session.user_email)?;
        Ok(())
    }

    /// Clears every session key and returns the route to redirect to.
    pub fn logout(&mut self) -> &'static str {
        if let AuthState::Authenticated(session) = &self.state {
            info!("Logging out {}", session.user_name);
        }
        clear_session_keys(self.store);
        self.state = AuthState::Unauthenticated;
        LOGIN_ROUTE
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            AuthState::Authenticated(session) => Some(session),
            AuthState::Unauthenticated => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_some()
    }

    pub fn default_route(&self) -> &'static str {
        default_route(self.store)
    }
}

/// Logout without a rehydrated controller, for a session the backend has
/// already rejected.
pub fn force_logout<S: TokenStore + ?Sized>(store: &S) -> &'static str {
    let user_name = store
        .get(USER_NAME)
        .unwrap_or_else(|| DEFAULT_USER_NAME.to_string());
    info!("Forcing logout of {}", user_name);
    clear_session_keys(store);
    LOGIN_ROUTE
}

/// Landing route derived from the stored role and profile flag.
pub fn default_route<S: TokenStore + ?Sized>(store: &S) -> &'static str {
    let role = store.get(USER_ROLE).and_then(|r| Role::from_str(&r).ok());
    let requires_profile = store
        .get(REQUIRES_CUSTOMER_PROFILE)
        .is_some_and(|v| v == "true");
    default_route_for(role, requires_profile)
}

/// Profile completion wins over every role-based dashboard.
pub fn default_route_for(role: Option<Role>, requires_profile_completion: bool) -> &'static str {
    match role {
        Some(Role::Customer) if requires_profile_completion => PROFILE_COMPLETION_ROUTE,
        Some(Role::Admin) | Some(Role::BranchAdmin) => ADMIN_DASHBOARD_ROUTE,
        Some(Role::Clerk) => CLERK_DASHBOARD_ROUTE,
        Some(Role::Customer) => CUSTOMER_DASHBOARD_ROUTE,
        None => LOGIN_ROUTE,
    }
}
