use crate::errors::TokenError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

pub const DEFAULT_USER_NAME: &str = "User";
pub const DEFAULT_USER_EMAIL: &str = "user@example.com";

// Claim key candidates, most specific issuer first.
pub const NAME_CLAIMS: [&str; 3] = [
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/name",
    "username",
    "unique_name",
];
pub const EMAIL_CLAIMS: [&str; 2] = [
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/emailaddress",
    "email",
];
pub const ROLE_CLAIMS: [&str; 2] = [
    "http://schemas.microsoft.com/ws/2008/06/identity/claims/role",
    "role",
];
pub const USER_TYPE_ID_CLAIMS: [&str; 2] = ["userTypeId", "UserTypeId"];
pub const BRANCH_ID_CLAIMS: [&str; 2] = ["branchId", "BranchId"];

/// Decoded, read-only payload of a session token.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenClaims(Map<String, Value>);

impl TokenClaims {
    /// Expiry in unix seconds. Accepts integer, float or numeric string claims.
    pub fn exp(&self) -> Option<i64> {
        match self.0.get("exp")? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// A claim rendered as text, if present and non-empty.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn first_of(&self, candidates: &[&str]) -> Option<String> {
        candidates.iter().find_map(|key| self.text(key))
    }

    pub fn user_name(&self) -> String {
        first_present(self, &NAME_CLAIMS, DEFAULT_USER_NAME)
    }

    pub fn user_email(&self) -> String {
        first_present(self, &EMAIL_CLAIMS, DEFAULT_USER_EMAIL)
    }

    pub fn role(&self) -> Option<String> {
        self.first_of(&ROLE_CLAIMS)
    }

    pub fn user_type_id(&self) -> Option<i64> {
        self.first_of(&USER_TYPE_ID_CLAIMS)?.parse().ok()
    }

    pub fn branch_id(&self) -> Option<i64> {
        self.first_of(&BRANCH_ID_CLAIMS)?.parse().ok()
    }
}

/// First candidate claim that is present, else `default`.
pub fn first_present(claims: &TokenClaims, candidates: &[&str], default: &str) -> String {
    claims
        .first_of(candidates)
        .unwrap_or_else(|| default.to_string())
}

/// Decodes the payload segment of a `header.payload.signature` token.
/// The signature is not checked; the backend re-authorizes every call.
pub fn decode(token: &str) -> Result<TokenClaims, TokenError> {
    let segments: Vec<&str> = token.trim().split('.').collect();
    let payload = match segments.as_slice() {
        [_, payload, _] if !payload.is_empty() => *payload,
        _ => return Err(TokenError::Malformed),
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| TokenError::Base64(e.to_string()))?;

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Ok(TokenClaims(map)),
        Ok(other) => Err(TokenError::Json(format!("expected object, found {}", other))),
        Err(e) => Err(TokenError::Json(e.to_string())),
    }
}

/// Validates expiry only: `exp * 1000 > now` in milliseconds.
pub fn validate_at(token: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenError> {
    let claims = decode(token)?;
    let exp = claims.exp().ok_or(TokenError::MissingExp)?;
    if exp.saturating_mul(1000) > now.timestamp_millis() {
        Ok(claims)
    } else {
        Err(TokenError::Expired)
    }
}

pub fn is_valid_at(token: Option<&str>, now: DateTime<Utc>) -> bool {
    match token {
        Some(t) if !t.is_empty() => validate_at(t, now).is_ok(),
        _ => false,
    }
}

pub fn is_valid(token: Option<&str>) -> bool {
    is_valid_at(token, Utc::now())
}
