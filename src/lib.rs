pub mod config;
pub mod db;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use sqlx::PgPool;

use config::Config;
use services::{email::EmailService, passcodes::PasscodeStore, tokens::TokenService};

/// Application state shared across all handlers. Everything here is
/// constructed once at startup and injected — no module-level singletons.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub redis: redis::aio::MultiplexedConnection,
    pub config: Arc<Config>,
    pub tokens: TokenService,
    pub passcodes: PasscodeStore,
    pub email: Option<Arc<EmailService>>,
}
