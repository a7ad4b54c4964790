pub mod api_client;
pub mod auth;
pub mod dashboard;
pub mod edit_session;
pub mod nepali_date;
pub mod route_guard;
pub mod session_controller;
pub mod store;
pub mod validation;
