pub mod dashboard;
pub mod entities;
pub mod profile;
pub mod user_auth;

use crate::errors::AppError;
use crate::handlers::store::{TokenStore, AUTH_TOKEN};

/// Bearer token for backend calls. A missing token reads as an expired
/// session so `SessionExpiry` can send the visitor back to login.
pub fn session_token<S: TokenStore + ?Sized>(store: &S) -> Result<String, AppError> {
    store.get(AUTH_TOKEN).ok_or(AppError::Unauthorized)
}
