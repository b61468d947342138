use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use redis::Client as RedisClient;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fraudbucket_api::{
    config::Config,
    db, routes,
    services::{email::EmailService, passcodes::PasscodeStore, tokens::TokenService},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(Config::from_env()?);

    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    info!("Database connected and migrations applied");

    let redis_client = RedisClient::open(config.redis_url.as_str())?;
    let redis_conn = redis_client.get_multiplexed_async_connection().await?;
    info!("Redis connected ({} mode)", config.environment);

    let tokens = TokenService::new(
        config.access_token_secret.clone(),
        config.refresh_token_secret.clone(),
        config.access_token_ttl_seconds,
        config.refresh_token_ttl_seconds,
    );
    let passcodes = PasscodeStore::new(redis_conn.clone(), config.passcode_ttl_seconds);

    let email = EmailService::new(&config).map(Arc::new);
    if email.is_some() {
        info!("SMTP email service configured");
    } else {
        info!("SMTP not configured — reset emails disabled");
    }

    let state = AppState {
        db: pool,
        redis: redis_conn,
        config: config.clone(),
        tokens: tokens.clone(),
        passcodes,
        email,
    };

    let app = Router::new()
        // App
        .route("/api/v1/app/status", get(routes::app::get_status))
        // Auth
        .route("/api/v1/auth/signin", post(routes::auth::sign_in))
        .route("/api/v1/auth/newToken", post(routes::auth::new_token))
        // Password reset
        .route(
            "/api/v1/user/request-password-reset",
            post(routes::users::request_password_reset),
        )
        .route(
            "/api/v1/user/password-reset",
            post(routes::users::password_reset),
        )
        // User resource
        .route(
            "/api/v1/user",
            get(routes::users::list_users).post(routes::users::create_user),
        )
        .route(
            "/api/v1/user/{id}",
            get(routes::users::get_user)
                .patch(routes::users::update_user)
                .delete(routes::users::delete_user),
        )
        .layer(axum::Extension(tokens))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("fraudBucket API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
