use crate::errors::AppError;
use crate::handlers::api_client::ApiClient;
use crate::handlers::auth;
use crate::handlers::session_controller::{SessionController, LOGIN_ROUTE};
use crate::handlers::store::{TokenStore, DARK_MODE, SIDEBAR_PINNED};
use crate::handlers::validation::Validate;
use crate::middleware::role_guard::redirect_to;
use crate::models::all_models::{
    AuthResponse, ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
    Role, Session,
};
use actix_session::Session as CookieSession;
use actix_web::{web, HttpResponse};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;

//Session View
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub authenticated: bool,
    pub session: Option<Session>,
    pub default_route: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

//Preferences Request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesRequest {
    pub dark_mode: Option<bool>,
    pub sidebar_pinned: Option<bool>,
}

/// Role from the response body, else from the token's own claims.
fn resolve_role(response: &AuthResponse) -> Option<Role> {
    Role::from_str(response.role.trim()).ok().or_else(|| {
        auth::decode(&response.token)
            .ok()?
            .role()
            .and_then(|r| Role::from_str(&r).ok())
    })
}

/// User type id from the response body, else from the token's own claims.
fn resolve_user_type_id(response: &AuthResponse) -> i64 {
    response
        .user_type_id
        .or_else(|| auth::decode(&response.token).ok()?.user_type_id())
        .unwrap_or(0)
}

/// Branch scope carried by the session token, for branch-bound roles.
fn branch_of(session: Option<&Session>) -> Option<i64> {
    auth::decode(&session?.token).ok()?.branch_id()
}

/// Shared by login and registration: turns a backend auth response into a
/// session and tells the client where to land.
fn open_session<S: TokenStore + ?Sized>(
    store: &S,
    response: AuthResponse,
) -> Result<SessionView, AppError> {
    let role = resolve_role(&response).ok_or_else(|| {
        warn!("Backend issued a session with unknown role '{}'", response.role);
        AppError::BadRequest(format!("Unknown role '{}'", response.role))
    })?;

    let mut controller = SessionController::initialize(store);
    let session = controller
        .login(
            resolve_user_type_id(&response),
            &response.token,
            role,
            response.requires_customer_profile,
        )?
        .clone();

    Ok(SessionView {
        authenticated: true,
        branch_id: branch_of(Some(&session)),
        session: Some(session),
        default_route: controller.default_route(),
        message: response.message,
    })
}

fn establish_session(
    store: &CookieSession,
    response: AuthResponse,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(open_session(store, response)?))
}

//Login
//Login Input: LoginRequest
//Login Output: SessionView
pub async fn login(
    store: CookieSession,
    api: web::Data<ApiClient>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    payload.check()?;
    let response = api.login(&payload).await?;
    establish_session(&store, response)
}

//Register
//Register Input: RegisterRequest
//Register Output: SessionView
pub async fn register(
    store: CookieSession,
    api: web::Data<ApiClient>,
    payload: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    payload.check()?;
    let response = api.register(&payload).await?;
    establish_session(&store, response)
}

//Forgot Password
//Forgot Password Input: ForgotPasswordRequest
//Forgot Password Output: MessageResponse
pub async fn forgot_password(
    api: web::Data<ApiClient>,
    payload: web::Json<ForgotPasswordRequest>,
) -> Result<HttpResponse, AppError> {
    payload.check()?;
    let response = api.forgot_password(&payload).await?;
    Ok(HttpResponse::Ok().json(response))
}

//Reset Password
//Reset Password Input: ResetPasswordRequest
//Reset Password Output: MessageResponse
pub async fn reset_password(
    api: web::Data<ApiClient>,
    payload: web::Json<ResetPasswordRequest>,
) -> Result<HttpResponse, AppError> {
    payload.check()?;
    let response = api.reset_password(&payload).await?;
    Ok(HttpResponse::Ok().json(response))
}

// Logout endpoint
pub async fn logout(store: CookieSession) -> HttpResponse {
    let target = SessionController::initialize(&store).logout();
    redirect_to(target)
}

// Current session, rehydrated from the cookie store
pub async fn current_session(store: CookieSession) -> HttpResponse {
    let controller = SessionController::initialize(&store);
    HttpResponse::Ok().json(SessionView {
        authenticated: controller.is_authenticated(),
        session: controller.session().cloned(),
        default_route: controller.default_route(),
        branch_id: branch_of(controller.session()),
        message: None,
    })
}

// UI preferences live next to the session and are cleared with it
pub async fn update_preferences(
    store: CookieSession,
    payload: web::Json<PreferencesRequest>,
) -> Result<HttpResponse, AppError> {
    if !SessionController::initialize(&store).is_authenticated() {
        return Ok(redirect_to(LOGIN_ROUTE));
    }
    if let Some(dark_mode) = payload.dark_mode {
        store.set(DARK_MODE, &dark_mode.to_string())?;
    }
    if let Some(pinned) = payload.sidebar_pinned {
        store.set(SIDEBAR_PINNED, &pinned.to_string())?;
    }
    Ok(HttpResponse::Ok().json(json!({
        "darkMode": TokenStore::get(&store, DARK_MODE).as_deref() == Some("true"),
        "sidebarPinned": TokenStore::get(&store, SIDEBAR_PINNED).as_deref() == Some("true"),
    })))
}

// Login page: a live session goes straight to its landing route
pub async fn login_page(store: CookieSession) -> HttpResponse {
    let controller = SessionController::initialize(&store);
    if controller.is_authenticated() {
        return redirect_to(controller.default_route());
    }
    HttpResponse::Ok().json(json!({ "view": "login" }))
}

pub async fn unauthorized_page(store: CookieSession) -> HttpResponse {
    let controller = SessionController::initialize(&store);
    HttpResponse::Forbidden().json(json!({
        "view": "unauthorized",
        "message": "You do not have access to this page",
        "home": controller.default_route(),
    }))
}

//Config User Auth Routes
// POST /auth/login
// POST /auth/register
// POST /auth/forgot-password
// POST /auth/reset-password
// POST /auth/logout
// GET /auth/session
// POST /preferences
// GET /login
// GET /unauthorized
pub fn config_user_auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/login", web::post().to(login))
            .route("/register", web::post().to(register))
            .route("/forgot-password", web::post().to(forgot_password))
            .route("/reset-password", web::post().to(reset_password))
            .route("/logout", web::post().to(logout))
            .route("/session", web::get().to(current_session)),
    )
    .route("/preferences", web::post().to(update_preferences))
    .route("/login", web::get().to(login_page))
    .route("/unauthorized", web::get().to(unauthorized_page));
}
