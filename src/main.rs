mod config;
mod errors;
mod handlers;
mod middleware;
mod models;
mod routes;

use actix_cors::Cors;
use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::{
    cookie::SameSite,
    middleware::Logger,
    web, App, HttpServer,
};
use anyhow::Context;
use config::AppConfig;
use handlers::api_client::ApiClient;
use log::info;
use middleware::request_logger::RequestLogger;
use routes::{
    dashboard::config_dashboard_routes, entities::config_entity_routes,
    profile::config_profile_routes, user_auth::config_user_auth_routes,
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("=== Billing Portal Starting ===");

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    let api = ApiClient::new(&config.api_base_url, config.api_timeout)
        .context("Failed to build backend client")?;
    info!("Backend API at {}", config.api_base_url);

    let secret_key = config.cookie_key();
    let cookie_secure = config.cookie_secure;
    let bind_address = config.bind_address.clone();

    info!("Listening on {}", bind_address);
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin_fn(|_origin, _req_head| true)
            .allow_any_method()
            .allow_any_header()
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(api.clone()))
            .wrap(RequestLogger)
            .wrap(cors)
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                    .cookie_secure(cookie_secure)
                    .cookie_http_only(true)
                    .cookie_same_site(SameSite::Lax)
                    .cookie_name("billing_session".to_string())
                    .cookie_path("/".to_string())
                    .build(),
            )
            .wrap(Logger::new("%t [%s] \"%r\" %b %D ms %a"))
            .configure(config_user_auth_routes)
            .configure(config_dashboard_routes)
            .configure(config_profile_routes)
            .configure(config_entity_routes)
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run()
    .await
    .context("Server terminated with an error")
}
