use crate::errors::AppError;
use crate::handlers::api_client::ApiClient;
use crate::handlers::dashboard::{admin_summary, clerk_summary, customer_summary};
use crate::handlers::edit_session::EntityKind;
use crate::handlers::session_controller::{
    SessionController, ADMIN_DASHBOARD_ROUTE, CLERK_DASHBOARD_ROUTE, CUSTOMER_DASHBOARD_ROUTE,
    LOGIN_ROUTE, PROFILE_COMPLETION_ROUTE,
};
use crate::middleware::role_guard::{redirect_to, RoleGuard};
use crate::middleware::session_expiry::SessionExpiry;
use crate::models::all_models::{Bill, Customer, Payment, Role, Session};
use crate::routes::session_token;
use actix_session::Session as CookieSession;
use actix_web::{web, HttpResponse};
use log::debug;
use serde::Serialize;

const BILLS_PATH: &str = "/api/Bill";
const PAYMENTS_PATH: &str = "/api/Payment";

fn customer_bills_path(customer_id: i64) -> String {
    format!("{}/customer/{}", BILLS_PATH, customer_id)
}

fn customer_payments_path(customer_id: i64) -> String {
    format!("{}/customer/{}", PAYMENTS_PATH, customer_id)
}

//Dashboard View
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView<T> {
    pub user_name: String,
    pub role: Role,
    pub summary: T,
}

fn current_session(store: &CookieSession) -> Result<Session, AppError> {
    SessionController::initialize(store)
        .session()
        .cloned()
        .ok_or(AppError::Unauthorized)
}

//Admin Dashboard
//Admin Dashboard Output: DashboardView<AdminDashboard>
pub async fn admin_dashboard(
    store: CookieSession,
    api: web::Data<ApiClient>,
) -> Result<HttpResponse, AppError> {
    let session = current_session(&store)?;
    let token = session_token(&store)?;
    let (bills, payments, customers) = tokio::try_join!(
        api.list::<Bill>(BILLS_PATH, &token),
        api.list::<Payment>(PAYMENTS_PATH, &token),
        api.list::<Customer>(EntityKind::Customer.api_path(), &token),
    )?;
    debug!(
        "Admin dashboard over {} bills, {} payments, {} customers",
        bills.len(),
        payments.len(),
        customers.len()
    );

    Ok(HttpResponse::Ok().json(DashboardView {
        user_name: session.user_name,
        role: session.role,
        summary: admin_summary(&bills, &payments, &customers),
    }))
}

//Clerk Dashboard
pub async fn clerk_dashboard(
    store: CookieSession,
    api: web::Data<ApiClient>,
) -> Result<HttpResponse, AppError> {
    let session = current_session(&store)?;
    let token = session_token(&store)?;
    let (bills, payments) = tokio::try_join!(
        api.list::<Bill>(BILLS_PATH, &token),
        api.list::<Payment>(PAYMENTS_PATH, &token),
    )?;

    Ok(HttpResponse::Ok().json(DashboardView {
        user_name: session.user_name,
        role: session.role,
        summary: clerk_summary(&bills, &payments),
    }))
}

//Customer Dashboard
// A customer without a profile is sent to complete it first
pub async fn customer_dashboard(
    store: CookieSession,
    api: web::Data<ApiClient>,
) -> Result<HttpResponse, AppError> {
    let session = current_session(&store)?;
    if session.requires_profile_completion {
        return Ok(redirect_to(PROFILE_COMPLETION_ROUTE));
    }
    let token = session_token(&store)?;
    let bills_path = customer_bills_path(session.user_type_id);
    let payments_path = customer_payments_path(session.user_type_id);
    let (bills, payments) = tokio::try_join!(
        api.list::<Bill>(&bills_path, &token),
        api.list::<Payment>(&payments_path, &token),
    )?;

    Ok(HttpResponse::Ok().json(DashboardView {
        user_name: session.user_name,
        role: session.role,
        summary: customer_summary(&bills, &payments),
    }))
}

// Root: straight to the landing route for whoever is signed in
pub async fn home(store: CookieSession) -> HttpResponse {
    let controller = SessionController::initialize(&store);
    if controller.is_authenticated() {
        redirect_to(controller.default_route())
    } else {
        redirect_to(LOGIN_ROUTE)
    }
}

//Config Dashboard Routes
// GET /                      any
// GET /dashboard             Admin, BranchAdmin
// GET /clerk/dashboard       Clerk
// GET /customer/dashboard    Customer
pub fn config_dashboard_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(home))
        .service(
            web::resource(ADMIN_DASHBOARD_ROUTE)
                .route(web::get().to(admin_dashboard))
                .wrap(SessionExpiry)
                .wrap(RoleGuard::new(&[Role::Admin, Role::BranchAdmin])),
        )
        .service(
            web::resource(CLERK_DASHBOARD_ROUTE)
                .route(web::get().to(clerk_dashboard))
                .wrap(SessionExpiry)
                .wrap(RoleGuard::new(&[Role::Clerk])),
        )
        .service(
            web::resource(CUSTOMER_DASHBOARD_ROUTE)
                .route(web::get().to(customer_dashboard))
                .wrap(SessionExpiry)
                .wrap(RoleGuard::new(&[Role::Customer])),
        );
}
