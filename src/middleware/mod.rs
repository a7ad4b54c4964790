pub mod request_logger;
pub mod role_guard;
pub mod session_expiry;
