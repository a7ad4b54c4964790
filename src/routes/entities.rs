use crate::errors::{ApiError, AppError};
use crate::handlers::api_client::ApiClient;
use crate::handlers::edit_session::{EditSession, EditableEntity, EntityKind, FormMode};
use crate::handlers::validation::Validate;
use crate::middleware::role_guard::{redirect_to, RoleGuard};
use crate::middleware::session_expiry::SessionExpiry;
use crate::models::all_models::{Branch, BranchAdmin, Customer, Employee, PaymentMethod, Role};
use crate::routes::session_token;
use actix_session::Session as CookieSession;
use actix_web::{web, HttpResponse, Scope};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

//List View
#[derive(Serialize)]
pub struct ListView<T> {
    pub items: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branches: Option<Vec<Branch>>,
}

//Submit Response
#[derive(Serialize)]
pub struct SubmitResponse {
    pub message: String,
    pub redirect: &'static str,
    pub result: Value,
}

/// Kinds whose views pick a branch from a dropdown.
fn uses_branch_lookup(kind: EntityKind) -> bool {
    matches!(
        kind,
        EntityKind::BranchAdmin | EntityKind::Customer | EntityKind::Employee | EntityKind::Profile
    )
}

pub(crate) async fn branch_lookup(
    api: &ApiClient,
    token: &str,
    kind: EntityKind,
) -> Result<Option<Vec<Branch>>, ApiError> {
    if uses_branch_lookup(kind) {
        api.list(EntityKind::Branch.api_path(), token).await.map(Some)
    } else {
        Ok(None)
    }
}

//List Entities
//List Input: session token
//List Output: ListView<T>
pub async fn list<T: EditableEntity + 'static>(
    store: CookieSession,
    api: web::Data<ApiClient>,
) -> Result<HttpResponse, AppError> {
    let token = session_token(&store)?;
    let (items, branches) = tokio::try_join!(
        api.list::<T>(T::KIND.api_path(), &token),
        branch_lookup(&api, &token, T::KIND),
    )?;
    Ok(HttpResponse::Ok().json(ListView { items, branches }))
}

//Begin Edit
//Begin Edit Input: the full record as shown in the list
//Begin Edit Output: 302 to the form route
pub async fn begin_edit<T: EditableEntity + 'static>(
    store: CookieSession,
    payload: web::Json<T>,
) -> Result<HttpResponse, AppError> {
    if payload.id() <= 0 {
        return Err(AppError::BadRequest(format!(
            "Cannot edit a {} that has not been saved",
            T::KIND
        )));
    }
    let target = EditSession::<CookieSession, T>::new(&store).begin_edit(&payload)?;
    Ok(redirect_to(&target))
}

// Begin create: drops any pending edit and opens a blank form
pub async fn begin_create<T: EditableEntity + 'static>(store: CookieSession) -> HttpResponse {
    let target = EditSession::<CookieSession, T>::new(&store).begin_create();
    redirect_to(&target)
}

//Load Form
//Load Form Output: { form: FormMode<T>, branches }
pub async fn form<T: EditableEntity + 'static>(
    store: CookieSession,
    api: web::Data<ApiClient>,
) -> Result<HttpResponse, AppError> {
    let token = session_token(&store)?;
    let mode = EditSession::<CookieSession, T>::new(&store).consume();
    let branches = branch_lookup(&api, &token, T::KIND).await?;
    Ok(HttpResponse::Ok().json(json!({ "form": mode, "branches": branches })))
}

//Submit Query
// A form loaded for update echoes back the `sessionId` it was given
#[derive(Debug, Deserialize)]
pub struct SubmitQuery {
    #[serde(rename = "sessionId")]
    pub session_id: Option<Uuid>,
}

//Submit Form
//Submit Input: T, ?sessionId=<uuid> when the form was loaded for update
//Submit Output: SubmitResponse
pub async fn submit<T: EditableEntity + Validate + 'static>(
    store: CookieSession,
    api: web::Data<ApiClient>,
    query: web::Query<SubmitQuery>,
    payload: web::Json<T>,
) -> Result<HttpResponse, AppError> {
    let entity = payload.into_inner();
    entity.check()?;
    let token = session_token(&store)?;
    let kind = T::KIND;
    let edit = EditSession::<CookieSession, T>::new(&store);

    let (result, verb) = match edit.resolve_submit(query.session_id)? {
        FormMode::Update { id, .. } => {
            info!("Updating {} {}", kind, id);
            let result = api.update(kind.api_path(), id, &token, &entity).await?;
            edit.complete();
            (result, "updated")
        }
        FormMode::Create { .. } => {
            info!("Creating {}", kind);
            (api.create(kind.api_path(), &token, &entity).await?, "created")
        }
    };

    Ok(HttpResponse::Ok().json(SubmitResponse {
        message: format!("{} {} successfully", kind, verb),
        redirect: kind.list_route(),
        result,
    }))
}

/// Edit, create and form routes shared by every entity scope.
pub(crate) fn form_routes<T: EditableEntity + Validate + 'static>(scope: Scope) -> Scope {
    scope
        .route("/edit", web::post().to(begin_edit::<T>))
        .route("/new", web::post().to(begin_create::<T>))
        .service(
            web::resource("/form")
                .route(web::get().to(form::<T>))
                .route(web::post().to(submit::<T>)),
        )
}

fn entity_scope<T: EditableEntity + Validate + 'static>() -> Scope {
    form_routes::<T>(web::scope(T::KIND.list_route()).route("", web::get().to(list::<T>)))
}

//Config Entity Routes
// /branches          Admin
// /branch-admins     Admin
// /payment-methods   Admin, BranchAdmin
// /customers         Admin, BranchAdmin, Clerk
// /employees         Admin, BranchAdmin
pub fn config_entity_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        entity_scope::<Branch>()
            .wrap(SessionExpiry)
            .wrap(RoleGuard::new(&[Role::Admin])),
    )
    .service(
        entity_scope::<BranchAdmin>()
            .wrap(SessionExpiry)
            .wrap(RoleGuard::new(&[Role::Admin])),
    )
    .service(
        entity_scope::<PaymentMethod>()
            .wrap(SessionExpiry)
            .wrap(RoleGuard::new(&[Role::Admin, Role::BranchAdmin])),
    )
    .service(
        entity_scope::<Customer>()
            .wrap(SessionExpiry)
            .wrap(RoleGuard::new(&[Role::Admin, Role::BranchAdmin, Role::Clerk])),
    )
    .service(
        entity_scope::<Employee>()
            .wrap(SessionExpiry)
            .wrap(RoleGuard::new(&[Role::Admin, Role::BranchAdmin])),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::auth::test_tokens::with_exp_offset;
    use crate::handlers::session_controller::SessionController;
    use crate::handlers::store::TokenStore;
    use actix_session::{storage::CookieSessionStore, SessionMiddleware};
    use actix_web::{
        cookie::{Cookie, Key},
        dev::ServiceResponse,
        http::{header, Method, StatusCode},
        test as actix_test, App, HttpRequest, HttpServer,
    };
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    type Calls = Arc<Mutex<Vec<(Method, String, Value)>>>;

    // Unroutable backend: tests here never reach it.
    fn api() -> web::Data<ApiClient> {
        web::Data::new(ApiClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap())
    }

    fn sessions(key: &Key) -> SessionMiddleware<CookieSessionStore> {
        SessionMiddleware::builder(CookieSessionStore::default(), key.clone())
            .cookie_secure(false)
            .build()
    }

    async fn login_as(store: CookieSession, path: web::Path<String>) -> HttpResponse {
        let role: Role = path.into_inner().parse().unwrap();
        let token = with_exp_offset(3600, json!({ "unique_name": "tester" }));
        SessionController::initialize(&store)
            .login(1, &token, role, false)
            .unwrap();
        HttpResponse::Ok().finish()
    }

    async fn peek(store: CookieSession, path: web::Path<String>) -> HttpResponse {
        let value = TokenStore::get(&store, &path.into_inner()).unwrap_or_default();
        HttpResponse::Ok().body(value)
    }

    fn session_cookie(res: &ServiceResponse) -> Cookie<'static> {
        res.response()
            .cookies()
            .next()
            .map(|c| c.into_owned())
            .unwrap()
    }

    /// The cookie a response set, else the one the request carried.
    fn carry(res: &ServiceResponse, previous: Cookie<'static>) -> Cookie<'static> {
        res.response()
            .cookies()
            .next()
            .map(|c| c.into_owned())
            .unwrap_or(previous)
    }

    async fn record(req: HttpRequest, body: web::Bytes, calls: web::Data<Calls>) -> HttpResponse {
        let payload = serde_json::from_slice(&body).unwrap_or(Value::Null);
        calls
            .lock()
            .unwrap()
            .push((req.method().clone(), req.path().to_string(), payload));
        if req.method() == Method::GET {
            HttpResponse::Ok().json(json!([]))
        } else {
            HttpResponse::Ok().json(json!({ "ok": true }))
        }
    }

    /// Local backend that records every call and answers with canned bodies.
    fn stub_backend() -> (web::Data<ApiClient>, Calls) {
        let calls = Calls::default();
        let recorded = calls.clone();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(web::Data::new(recorded.clone()))
                .default_service(web::to(record))
        })
        .workers(1)
        .disable_signals()
        .bind(("127.0.0.1", 0))
        .unwrap();
        let addr = server.addrs()[0];
        actix_web::rt::spawn(server.run());

        let api = ApiClient::new(&format!("http://{}", addr), Duration::from_secs(5)).unwrap();
        (web::Data::new(api), calls)
    }

    #[actix_web::test]
    async fn begin_edit_redirects_to_form_and_stores_the_handle() {
        let key = Key::generate();
        let app = actix_test::init_service(
            App::new()
                .wrap(sessions(&key))
                .app_data(api())
                .route("/test/login/{role}", web::get().to(login_as))
                .route("/test/peek/{key}", web::get().to(peek))
                .configure(config_entity_routes),
        )
        .await;

        let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/test/login/Admin").to_request()).await;
        let cookie = session_cookie(&res);

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/branches/edit")
                .cookie(cookie)
                .set_json(json!({ "id": 7, "name": "Pokhara", "address": "Lakeside" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(
            res.headers().get(header::LOCATION).unwrap(),
            "/branches/form?edit=true"
        );

        let cookie = session_cookie(&res);
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/test/peek/isEditBranchOperation")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(actix_test::read_body(res).await, "true");
    }

    #[actix_web::test]
    async fn unsaved_records_cannot_be_edited() {
        let key = Key::generate();
        let app = actix_test::init_service(
            App::new()
                .wrap(sessions(&key))
                .app_data(api())
                .route("/test/login/{role}", web::get().to(login_as))
                .configure(config_entity_routes),
        )
        .await;

        let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/test/login/Admin").to_request()).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/branches/edit")
                .cookie(session_cookie(&res))
                .set_json(json!({ "name": "Pokhara" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn clerk_is_sent_to_unauthorized_for_branches() {
        let key = Key::generate();
        let app = actix_test::init_service(
            App::new()
                .wrap(sessions(&key))
                .app_data(api())
                .route("/test/login/{role}", web::get().to(login_as))
                .configure(config_entity_routes),
        )
        .await;

        let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/test/login/Clerk").to_request()).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/branches/new")
                .cookie(session_cookie(&res))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(res.headers().get(header::LOCATION).unwrap(), "/unauthorized");
    }

    #[actix_web::test]
    async fn anonymous_visitors_go_to_login() {
        let key = Key::generate();
        let app = actix_test::init_service(
            App::new()
                .wrap(sessions(&key))
                .app_data(api())
                .configure(config_entity_routes),
        )
        .await;

        let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/customers").to_request()).await;
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(res.headers().get(header::LOCATION).unwrap(), "/login");
    }

    #[actix_web::test]
    async fn invalid_submit_is_rejected_before_the_backend() {
        let key = Key::generate();
        let app = actix_test::init_service(
            App::new()
                .wrap(sessions(&key))
                .app_data(api())
                .route("/test/login/{role}", web::get().to(login_as))
                .configure(config_entity_routes),
        )
        .await;

        let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/test/login/Admin").to_request()).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/payment-methods/form")
                .cookie(session_cookie(&res))
                .set_json(json!({ "name": "" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn branch_lookups_are_limited_to_branch_scoped_kinds() {
        assert!(!uses_branch_lookup(EntityKind::Branch));
        assert!(!uses_branch_lookup(EntityKind::PaymentMethod));
        assert!(uses_branch_lookup(EntityKind::Customer));
        assert!(uses_branch_lookup(EntityKind::Profile));
    }

    #[actix_web::test]
    async fn edited_record_opens_the_form_in_update_mode() {
        let key = Key::generate();
        let (api, _calls) = stub_backend();
        let app = actix_test::init_service(
            App::new()
                .wrap(sessions(&key))
                .app_data(api)
                .route("/test/login/{role}", web::get().to(login_as))
                .configure(config_entity_routes),
        )
        .await;

        let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/test/login/Admin").to_request()).await;
        let cookie = session_cookie(&res);
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/branches/edit")
                .cookie(cookie.clone())
                .set_json(json!({ "id": 7, "name": "Pokhara", "address": "Lakeside" }))
                .to_request(),
        )
        .await;
        let cookie = carry(&res, cookie);

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/branches/form").cookie(cookie).to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["form"]["mode"], "update");
        assert_eq!(body["form"]["id"], 7);
        assert_eq!(body["form"]["initial"]["name"], "Pokhara");
        assert!(body["form"]["sessionId"].as_str().is_some());
    }

    #[actix_web::test]
    async fn new_after_edit_opens_a_blank_form() {
        let key = Key::generate();
        let (api, _calls) = stub_backend();
        let app = actix_test::init_service(
            App::new()
                .wrap(sessions(&key))
                .app_data(api)
                .route("/test/login/{role}", web::get().to(login_as))
                .configure(config_entity_routes),
        )
        .await;

        let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/test/login/Admin").to_request()).await;
        let cookie = session_cookie(&res);
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/branches/edit")
                .cookie(cookie.clone())
                .set_json(json!({ "id": 7, "name": "Pokhara", "address": "Lakeside" }))
                .to_request(),
        )
        .await;
        let cookie = carry(&res, cookie);
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post().uri("/branches/new").cookie(cookie.clone()).to_request(),
        )
        .await;
        assert_eq!(
            res.headers().get(header::LOCATION).unwrap(),
            "/branches/form?new=true"
        );
        let cookie = carry(&res, cookie);

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/branches/form").cookie(cookie).to_request(),
        )
        .await;
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["form"]["mode"], "create");
        assert_eq!(body["form"]["initial"]["id"], 0);
        assert!(body["form"].get("sessionId").is_none());
    }

    #[actix_web::test]
    async fn update_submit_puts_and_clears_the_handle() {
        let key = Key::generate();
        let (api, calls) = stub_backend();
        let app = actix_test::init_service(
            App::new()
                .wrap(sessions(&key))
                .app_data(api)
                .route("/test/login/{role}", web::get().to(login_as))
                .route("/test/peek/{key}", web::get().to(peek))
                .configure(config_entity_routes),
        )
        .await;

        let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/test/login/Admin").to_request()).await;
        let cookie = session_cookie(&res);
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/branches/edit")
                .cookie(cookie.clone())
                .set_json(json!({ "id": 7, "name": "Pokhara", "address": "Lakeside" }))
                .to_request(),
        )
        .await;
        let cookie = carry(&res, cookie);
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/branches/form").cookie(cookie.clone()).to_request(),
        )
        .await;
        let cookie = carry(&res, cookie);
        let body: Value = actix_test::read_body_json(res).await;
        let session_id = body["form"]["sessionId"].as_str().unwrap().to_string();

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri(&format!("/branches/form?sessionId={}", session_id))
                .cookie(cookie.clone())
                .set_json(json!({ "id": 7, "name": "Pokhara North", "address": "Lakeside" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let cookie = carry(&res, cookie);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["redirect"], "/branches");
        assert_eq!(body["message"], "Branch updated successfully");

        {
            let calls = calls.lock().unwrap();
            assert_eq!(calls.len(), 1);
            assert_eq!(calls[0].0, Method::PUT);
            assert_eq!(calls[0].1, "/api/Branch/7");
            assert_eq!(calls[0].2["name"], "Pokhara North");
        }

        for key in ["isEditBranchOperation", "editBranchData", "editBranchSessionId"] {
            let res = actix_test::call_service(
                &app,
                actix_test::TestRequest::get()
                    .uri(&format!("/test/peek/{}", key))
                    .cookie(cookie.clone())
                    .to_request(),
            )
            .await;
            assert_eq!(actix_test::read_body(res).await, "", "{} survived the submit", key);
        }
    }

    #[actix_web::test]
    async fn blank_form_submit_posts() {
        let key = Key::generate();
        let (api, calls) = stub_backend();
        let app = actix_test::init_service(
            App::new()
                .wrap(sessions(&key))
                .app_data(api)
                .route("/test/login/{role}", web::get().to(login_as))
                .configure(config_entity_routes),
        )
        .await;

        let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/test/login/Admin").to_request()).await;
        let cookie = session_cookie(&res);
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post().uri("/branches/new").cookie(cookie.clone()).to_request(),
        )
        .await;
        let cookie = carry(&res, cookie);

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/branches/form")
                .cookie(cookie)
                .set_json(json!({ "name": "Butwal", "address": "Traffic Chowk" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["message"], "Branch created successfully");

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, Method::POST);
        assert_eq!(calls[0].1, "/api/Branch");
        assert_eq!(calls[0].2["name"], "Butwal");
    }

    #[actix_web::test]
    async fn submit_from_an_older_tab_is_refused() {
        let key = Key::generate();
        let (api, calls) = stub_backend();
        let app = actix_test::init_service(
            App::new()
                .wrap(sessions(&key))
                .app_data(api)
                .route("/test/login/{role}", web::get().to(login_as))
                .configure(config_entity_routes),
        )
        .await;

        let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/test/login/Admin").to_request()).await;
        let mut cookie = session_cookie(&res);
        let mut session_ids = Vec::new();
        for id in [7, 9] {
            let res = actix_test::call_service(
                &app,
                actix_test::TestRequest::post()
                    .uri("/branches/edit")
                    .cookie(cookie.clone())
                    .set_json(json!({ "id": id, "name": "Branch", "address": "Somewhere" }))
                    .to_request(),
            )
            .await;
            cookie = carry(&res, cookie);
            let res = actix_test::call_service(
                &app,
                actix_test::TestRequest::get().uri("/branches/form").cookie(cookie.clone()).to_request(),
            )
            .await;
            cookie = carry(&res, cookie);
            let body: Value = actix_test::read_body_json(res).await;
            assert_eq!(body["form"]["id"], id);
            session_ids.push(body["form"]["sessionId"].as_str().unwrap().to_string());
        }

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri(&format!("/branches/form?sessionId={}", session_ids[0]))
                .cookie(cookie.clone())
                .set_json(json!({ "id": 7, "name": "Branch", "address": "Somewhere" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CONFLICT);
        let cookie = carry(&res, cookie);
        assert!(calls.lock().unwrap().is_empty());

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/branches/form").cookie(cookie).to_request(),
        )
        .await;
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["form"]["mode"], "update");
        assert_eq!(body["form"]["id"], 9);
    }

    #[actix_web::test]
    async fn session_cookie_stays_under_browser_limit_across_kinds() {
        let key = Key::generate();
        let app = actix_test::init_service(
            App::new()
                .wrap(sessions(&key))
                .app_data(api())
                .route("/test/login/{role}", web::get().to(login_as))
                .configure(config_entity_routes),
        )
        .await;

        let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/test/login/Admin").to_request()).await;
        let mut cookie = session_cookie(&res);
        let long = "x".repeat(300);
        let records = [
            ("/branches/edit", json!({ "id": 1, "name": long, "address": long, "phone": long })),
            ("/branch-admins/edit", json!({ "id": 2, "fullName": long, "email": long, "phone": long, "branchId": 1 })),
            ("/payment-methods/edit", json!({ "id": 3, "name": long, "description": long })),
            ("/customers/edit", json!({
                "id": 4, "fullName": long, "email": long, "address": long,
                "meterNumber": "MTR-0042", "nepaliMonth": "Baisakh", "nepaliYear": 2081
            })),
            ("/employees/edit", json!({ "id": 5, "fullName": long, "email": long, "position": long })),
        ];

        for (uri, record) in records {
            let res = actix_test::call_service(
                &app,
                actix_test::TestRequest::post()
                    .uri(uri)
                    .cookie(cookie.clone())
                    .set_json(record)
                    .to_request(),
            )
            .await;
            assert_eq!(res.status(), StatusCode::FOUND, "{} was refused", uri);
            cookie = carry(&res, cookie);
            assert!(
                cookie.to_string().len() < 4096,
                "cookie reached {} bytes after {}",
                cookie.to_string().len(),
                uri
            );
        }
    }

    #[actix_web::test]
    async fn oversized_record_is_refused_with_413() {
        let key = Key::generate();
        let app = actix_test::init_service(
            App::new()
                .wrap(sessions(&key))
                .app_data(api())
                .route("/test/login/{role}", web::get().to(login_as))
                .configure(config_entity_routes),
        )
        .await;

        let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/test/login/Admin").to_request()).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/branches/edit")
                .cookie(session_cookie(&res))
                .set_json(json!({ "id": 7, "name": "n".repeat(4000), "address": "Lakeside" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
