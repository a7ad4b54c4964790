use crate::errors::StoreError;
use actix_session::Session as CookieSession;
use log::warn;
#[cfg(test)]
use std::cell::RefCell;
#[cfg(test)]
use std::collections::HashMap;

pub const AUTH_TOKEN: &str = "authToken";
pub const USER_ROLE: &str = "userRole";
pub const USER_TYPE_ID: &str = "userTypeId";
pub const USER_NAME: &str = "userName";
pub const USER_EMAIL: &str = "userEmail";
pub const REQUIRES_CUSTOMER_PROFILE: &str = "requiresCustomerProfile";
pub const SIDEBAR_PINNED: &str = "sidebarPinned";
pub const DARK_MODE: &str = "darkMode";

/// Every key a logout or a failed guard check must remove.
pub const SESSION_KEYS: [&str; 8] = [
    AUTH_TOKEN,
    USER_ROLE,
    USER_TYPE_ID,
    USER_NAME,
    USER_EMAIL,
    REQUIRES_CUSTOMER_PROFILE,
    DARK_MODE,
    SIDEBAR_PINNED,
];

/// Origin-scoped key-value store holding the session token, its denormalized
/// claims and the edit handoff keys. The store never expires anything itself.
pub trait TokenStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str);
    fn clear(&self);
}

impl TokenStore for CookieSession {
    fn get(&self, key: &str) -> Option<String> {
        match CookieSession::get::<String>(self, key) {
            Ok(value) => value,
            Err(e) => {
                warn!("Unreadable session entry {}: {}", key, e);
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        CookieSession::insert(self, key, value).map_err(|e| StoreError(e.to_string()))
    }

    fn remove(&self, key: &str) {
        CookieSession::remove(self, key);
    }

    fn clear(&self) {
        CookieSession::clear(self);
    }
}

/// In-process store for exercising session logic without a cookie.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

#[cfg(test)]
impl TokenStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.entries.borrow_mut().remove(key);
    }

    fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

/// Removes every session key, leaving unrelated entries alone.
pub fn clear_session_keys<S: TokenStore + ?Sized>(store: &S) {
    for key in SESSION_KEYS {
        store.remove(key);
    }
}
