mod auth;
mod error_handler;

pub use auth::{AUTH_HEADER, require_token};
pub use error_handler::log_errors;
