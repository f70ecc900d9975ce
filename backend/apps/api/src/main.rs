//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

mod config;

use axum::{
    ServiceExt, extract::Request, http,
    http::{Method, header},
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use users::infra::{AppMailer, AuthyClient, HttpActivationGateway, LogMailer, SmtpMailer};
use users::{
    PgServices, PgUsersRepository, UsersAppState, accounts_router, trim_trailing_slash,
};

use crate::config::AppConfig;

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,users=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    // Database connection
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    let store = PgUsersRepository::new(pool.clone());

    // Startup cleanup: remove expired sessions
    // Errors here should not prevent server startup
    if let Err(e) = store.cleanup_expired().await {
        tracing::warn!(
            error = %e,
            "Auth session cleanup failed, continuing anyway"
        );
    }

    let provider = AuthyClient::new(
        config.authy_api_url.clone(),
        config.authy_api_key.clone(),
        config.provider_timeout,
    )?;

    let mailer = match &config.smtp {
        Some(settings) => {
            tracing::info!(host = %settings.host, "Sending activation emails over SMTP");
            AppMailer::Smtp(SmtpMailer::new(settings)?)
        }
        None => {
            tracing::warn!("SMTP_HOST not set, activation emails are only logged");
            AppMailer::Log(LogMailer)
        }
    };

    let gateway = HttpActivationGateway::new(config.provider_timeout)?;

    let state = UsersAppState::<PgServices>::new(store, provider, mailer, gateway, config.users);

    // CORS configuration
    let allowed_origins: Vec<http::HeaderValue> = config
        .frontend_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Build router
    let app = trim_trailing_slash(
        accounts_router(state)
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    );

    // Start server
    let addr = config.bind_addr;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .await?;

    Ok(())
}
