use std::sync::Arc;

use auth::TokenService;
use config::Config;

pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod reclaim;
pub mod router;
pub mod routes;
pub mod store;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub tokens: Arc<TokenService>,
}
