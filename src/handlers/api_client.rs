use crate::errors::ApiError;
use crate::models::all_models::{
    AuthResponse, ForgotPasswordRequest, LoginRequest, MessageResponse, RegisterRequest,
    ResetPasswordRequest,
};
use log::{debug, error, info};
use reqwest::{header, Client, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::time::Duration;

// Backend /api/UserAuth endpoints
const LOGIN_PATH: &str = "/api/UserAuth/login";
const REGISTER_PATH: &str = "/api/UserAuth/register";
const FORGOT_PASSWORD_PATH: &str = "/api/UserAuth/forgot-password";
const RESET_PASSWORD_PATH: &str = "/api/UserAuth/reset-password";

/// Whether a 401 means "your session is gone" or just "bad credentials".
#[derive(Debug, Clone, Copy, PartialEq)]
enum Access {
    Public,
    Protected,
}

/// Client for the billing backend. Cheap to clone; no retries.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(ApiClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn login(&self, payload: &LoginRequest) -> Result<AuthResponse, ApiError> {
        info!("Logging in {} against backend", payload.username);
        let request = self.client.post(self.url(LOGIN_PATH)).json(payload);
        self.send(request, Access::Public).await
    }

    pub async fn register(&self, payload: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        info!("Registering {} against backend", payload.username);
        let request = self.client.post(self.url(REGISTER_PATH)).json(payload);
        self.send(request, Access::Public).await
    }

    pub async fn forgot_password(
        &self,
        payload: &ForgotPasswordRequest,
    ) -> Result<MessageResponse, ApiError> {
        let request = self.client.post(self.url(FORGOT_PASSWORD_PATH)).json(payload);
        self.send(request, Access::Public).await
    }

    pub async fn reset_password(
        &self,
        payload: &ResetPasswordRequest,
    ) -> Result<MessageResponse, ApiError> {
        let request = self.client.post(self.url(RESET_PASSWORD_PATH)).json(payload);
        self.send(request, Access::Public).await
    }

    pub async fn list<T: DeserializeOwned>(&self, path: &str, token: &str) -> Result<Vec<T>, ApiError> {
        self.fetch(path, token).await
    }

    pub async fn fetch<R: DeserializeOwned>(&self, path: &str, token: &str) -> Result<R, ApiError> {
        let request = self
            .client
            .get(self.url(path))
            .header(header::AUTHORIZATION, format!("Bearer {}", token));
        self.send(request, Access::Protected).await
    }

    pub async fn create<T: Serialize>(&self, path: &str, token: &str, body: &T) -> Result<Value, ApiError> {
        let request = self
            .client
            .post(self.url(path))
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .json(body);
        self.send(request, Access::Protected).await
    }

    pub async fn update<T: Serialize>(
        &self,
        path: &str,
        id: i64,
        token: &str,
        body: &T,
    ) -> Result<Value, ApiError> {
        let request = self
            .client
            .put(self.url(&format!("{}/{}", path.trim_end_matches('/'), id)))
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .json(body);
        self.send(request, Access::Protected).await
    }

    async fn send<R: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        access: Access,
    ) -> Result<R, ApiError> {
        let response = request.send().await.map_err(|e| {
            error!("Backend request failed: {}", e);
            ApiError::Network(e.to_string())
        })?;

        let status = response.status();
        let url = response.url().path().to_string();
        debug!("Backend {} responded {}", url, status);

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if let Some(err) = classify(status, &body, access) {
            error!("Backend {} failed: {}", url, err);
            return Err(err);
        }

        decode_body(&body).map_err(|e| {
            error!("Failed to parse backend response from {}: {}", url, e);
            e
        })
    }
}

/// An empty success body decodes as JSON `null`, so `Value` and
/// `Option`-shaped targets still succeed.
fn decode_body<R: DeserializeOwned>(body: &str) -> Result<R, ApiError> {
    let text = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(text).map_err(|e| ApiError::Decode(e.to_string()))
}

fn classify(status: StatusCode, body: &str, access: Access) -> Option<ApiError> {
    if status.is_success() {
        return None;
    }
    if status == StatusCode::UNAUTHORIZED && access == Access::Protected {
        return Some(ApiError::Unauthorized);
    }
    Some(ApiError::Status(status.as_u16(), error_message(status, body)))
}

/// Prefers the backend's `{ "message": ... }`, then the raw body.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<MessageResponse>(body) {
        if !parsed.message.is_empty() {
            return parsed.message;
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed.starts_with('{') {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::all_models::Branch;

    #[test]
    fn protected_401_invalidates_session() {
        assert_eq!(
            classify(StatusCode::UNAUTHORIZED, "", Access::Protected),
            Some(ApiError::Unauthorized)
        );
    }

    #[test]
    fn public_401_is_a_credentials_error() {
        assert_eq!(
            classify(
                StatusCode::UNAUTHORIZED,
                r#"{"message":"Invalid username or password"}"#,
                Access::Public
            ),
            Some(ApiError::Status(401, "Invalid username or password".into()))
        );
    }

    #[test]
    fn error_message_fallbacks() {
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, "Email already taken"),
            "Email already taken"
        );
        assert_eq!(error_message(StatusCode::NOT_FOUND, ""), "Not Found");
        assert_eq!(error_message(StatusCode::CONFLICT, "{}"), "Conflict");
    }

    #[test]
    fn success_is_not_classified() {
        assert_eq!(classify(StatusCode::OK, "[]", Access::Protected), None);
    }

    #[test]
    fn empty_success_body_decodes_as_null() {
        let value: Value = decode_body("").unwrap();
        assert_eq!(value, Value::Null);
        let branches: Vec<Branch> = decode_body(r#"[{"id":1,"name":"Pokhara"}]"#).unwrap();
        assert_eq!(branches[0].name, "Pokhara");
        assert!(matches!(decode_body::<Vec<Branch>>("oops"), Err(ApiError::Decode(_))));
    }

    #[test]
    fn urls_join_cleanly() {
        let api = ApiClient::new("http://backend.local/", Duration::from_secs(5)).unwrap();
        assert_eq!(api.url("/api/Branch"), "http://backend.local/api/Branch");
        assert_eq!(api.url(LOGIN_PATH), "http://backend.local/api/UserAuth/login");
    }
}
