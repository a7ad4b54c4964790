use crate::errors::AppError;
use crate::handlers::api_client::ApiClient;
use crate::handlers::edit_session::{EditSession, EditableEntity, EntityKind, FormMode};
use crate::handlers::session_controller::{self, SessionController, CUSTOMER_DASHBOARD_ROUTE};
use crate::handlers::store::{TokenStore, REQUIRES_CUSTOMER_PROFILE};
use crate::handlers::validation::Validate;
use crate::middleware::role_guard::{redirect_to, RoleGuard};
use crate::middleware::session_expiry::SessionExpiry;
use crate::models::all_models::{Profile, Role};
use crate::routes::entities::{branch_lookup, form_routes};
use crate::routes::session_token;
use actix_session::Session as CookieSession;
use actix_web::{web, HttpResponse};
use log::info;
use serde_json::json;

//View Profile
//View Profile Output: { profile, branches }
pub async fn view_profile(
    store: CookieSession,
    api: web::Data<ApiClient>,
) -> Result<HttpResponse, AppError> {
    let token = session_token(&store)?;
    let (profile, branches) = tokio::try_join!(
        api.fetch::<Profile>(EntityKind::Profile.api_path(), &token),
        branch_lookup(&api, &token, EntityKind::Profile),
    )?;
    Ok(HttpResponse::Ok().json(json!({ "profile": profile, "branches": branches })))
}

/// Blank profile seeded with the identity carried by the session.
fn seeded_profile<S: TokenStore + ?Sized>(store: &S) -> Profile {
    let controller = SessionController::initialize(store);
    match controller.session() {
        Some(session) => Profile {
            full_name: session.user_name.clone(),
            email: session.user_email.clone(),
            ..Profile::default()
        },
        None => Profile::default(),
    }
}

//Profile Completion Form
pub async fn completion_form(
    store: CookieSession,
    api: web::Data<ApiClient>,
) -> Result<HttpResponse, AppError> {
    if TokenStore::get(&store, REQUIRES_CUSTOMER_PROFILE).as_deref() != Some("true") {
        return Ok(redirect_to(CUSTOMER_DASHBOARD_ROUTE));
    }
    let token = session_token(&store)?;
    EditSession::<CookieSession, Profile>::new(&store).clear();
    let branches = branch_lookup(&api, &token, Profile::KIND).await?;
    let mode = FormMode::Create {
        initial: seeded_profile(&store),
    };
    Ok(HttpResponse::Ok().json(json!({ "form": mode, "branches": branches })))
}

//Complete Profile
//Complete Profile Input: Profile
//Complete Profile Output: { message, redirect }
pub async fn complete_profile(
    store: CookieSession,
    api: web::Data<ApiClient>,
    payload: web::Json<Profile>,
) -> Result<HttpResponse, AppError> {
    payload.check()?;
    let token = session_token(&store)?;
    api.create(Profile::KIND.api_path(), &token, &*payload).await?;

    store.set(REQUIRES_CUSTOMER_PROFILE, "false")?;
    EditSession::<CookieSession, Profile>::new(&store).complete();
    info!("Customer profile completed for {}", payload.email);

    Ok(HttpResponse::Ok().json(json!({
        "message": "Profile completed",
        "redirect": session_controller::default_route(&store),
    })))
}

//Config Profile Routes
// /profile                     Customer
// /customer/complete-profile   Customer
pub fn config_profile_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        form_routes::<Profile>(
            web::scope(EntityKind::Profile.list_route()).route("", web::get().to(view_profile)),
        )
        .wrap(SessionExpiry)
        .wrap(RoleGuard::new(&[Role::Customer])),
    )
    .service(
        web::resource(session_controller::PROFILE_COMPLETION_ROUTE)
            .route(web::get().to(completion_form))
            .route(web::post().to(complete_profile))
            .wrap(SessionExpiry)
            .wrap(RoleGuard::new(&[Role::Customer])),
    );
}
