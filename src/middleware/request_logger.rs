use crate::handlers::store::{TokenStore, USER_ROLE};
use actix_session::SessionExt;
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    Error,
};
use futures::future::{ok, LocalBoxFuture, Ready};
use log::{error, info};
use std::{rc::Rc, time::Instant};

// Logs each request with the visitor's role and where a redirect sent them.
pub struct RequestLogger;

impl<S, B> Transform<S, ServiceRequest> for RequestLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequestLoggerMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RequestLoggerMiddleware {
            service: Rc::new(service),
        })
    }
}

pub struct RequestLoggerMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequestLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start_time = Instant::now();
        let method = req.method().clone();
        let path = req.path().to_owned();
        let role = TokenStore::get(&req.get_session(), USER_ROLE)
            .unwrap_or_else(|| "anonymous".to_string());

        let service = self.service.clone();
        Box::pin(async move {
            let res = service.call(req).await;
            let elapsed = start_time.elapsed();

            match &res {
                Ok(response) => {
                    let redirect = response
                        .headers()
                        .get(header::LOCATION)
                        .and_then(|v| v.to_str().ok())
                        .map(|to| format!(" -> {}", to))
                        .unwrap_or_default();
                    info!(
                        "[BILLING-REQUEST] {} {} as {} - {}{} - {:.2?}",
                        method,
                        path,
                        role,
                        response.status().as_u16(),
                        redirect,
                        elapsed
                    );
                }
                Err(err) => {
                    error!(
                        "[BILLING-ERROR] {} {} as {} - {} - {:.2?}",
                        method, path, role, err, elapsed
                    );
                }
            }

            res
        })
    }
}
