use crate::handlers::session_controller;
use crate::middleware::role_guard::redirect_to;
use actix_session::SessionExt;
use actix_web::{
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::StatusCode,
    Error,
};
use futures_util::future::{ok, Ready};
use log::warn;
use std::{
    future::Future,
    pin::Pin,
    rc::Rc,
    task::{Context, Poll},
};

/// Treats any 401 produced downstream as a dead session: every session key
/// is cleared and the visitor is sent to the login page.
pub struct SessionExpiry;

impl<S, B> Transform<S, ServiceRequest> for SessionExpiry
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = SessionExpiryService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(SessionExpiryService {
            service: Rc::new(service),
        })
    }
}

pub struct SessionExpiryService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for SessionExpiryService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let session = req.get_session();

        Box::pin(async move {
            let res = service.call(req).await?;
            if res.status() != StatusCode::UNAUTHORIZED {
                return Ok(res.map_into_left_body());
            }

            warn!("Backend rejected session on {}, forcing logout", res.request().path());
            let target = session_controller::force_logout(&session);
            let (req, _) = res.into_parts();
            Ok(ServiceResponse::new(req, redirect_to(target)).map_into_right_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use crate::handlers::store::{TokenStore, AUTH_TOKEN, DARK_MODE};
    use actix_session::{storage::CookieSessionStore, Session, SessionMiddleware};
    use actix_web::{cookie::Key, http::header, test as actix_test, web, App, HttpResponse};

    async fn seed(session: Session) -> HttpResponse {
        TokenStore::set(&session, AUTH_TOKEN, "stale").unwrap();
        TokenStore::set(&session, DARK_MODE, "true").unwrap();
        HttpResponse::Ok().finish()
    }

    async fn rejected() -> Result<HttpResponse, AppError> {
        Err(AppError::Unauthorized)
    }

    async fn token(session: Session) -> HttpResponse {
        HttpResponse::Ok().body(TokenStore::get(&session, AUTH_TOKEN).unwrap_or_default())
    }

    #[actix_web::test]
    async fn unauthorized_responses_log_the_visitor_out() {
        let app = actix_test::init_service(
            App::new()
                .wrap(
                    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
                        .cookie_secure(false)
                        .build(),
                )
                .route("/seed", web::get().to(seed))
                .route("/token", web::get().to(token))
                .service(
                    web::scope("/guarded")
                        .wrap(SessionExpiry)
                        .route("", web::get().to(rejected)),
                ),
        )
        .await;

        let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/seed").to_request()).await;
        let cookie = res.response().cookies().next().unwrap().into_owned();

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/guarded").cookie(cookie).to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(res.headers().get(header::LOCATION).unwrap(), "/login");

        let cookie = res.response().cookies().next().unwrap().into_owned();
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/token").cookie(cookie).to_request(),
        )
        .await;
        assert_eq!(actix_test::read_body(res).await, "");
    }

    #[actix_web::test]
    async fn other_statuses_pass_through() {
        let app = actix_test::init_service(
            App::new()
                .wrap(
                    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
                        .cookie_secure(false)
                        .build(),
                )
                .service(
                    web::scope("/guarded")
                        .wrap(SessionExpiry)
                        .route("", web::get().to(|| async { HttpResponse::NotFound().finish() })),
                ),
        )
        .await;

        let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/guarded").to_request()).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
