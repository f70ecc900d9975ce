//! Users Router

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::normalize_path::NormalizePath;

use crate::infra::{AppMailer, AuthyClient, HttpActivationGateway, PgUsersRepository};
use crate::presentation::handlers::{self, UsersAppState, UsersServices};

/// Production wiring: Postgres, Authy, SMTP/log mailer, HTTP activation proxy
pub struct PgServices;

impl UsersServices for PgServices {
    type Store = PgUsersRepository;
    type Provider = AuthyClient;
    type Mailer = AppMailer;
    type Gateway = HttpActivationGateway;
}

/// Account routes, nested under `/api/auth/users`
pub fn users_router<S: UsersServices>(state: UsersAppState<S>) -> Router {
    Router::new()
        .route(
            "/",
            get(handlers::list_users::<S>).post(handlers::register::<S>),
        )
        .route("/me", get(handlers::me))
        .route("/vendor", post(handlers::register_vendor::<S>))
        .route("/phone-verify", post(handlers::phone_verify::<S>))
        .route("/phone-register", post(handlers::phone_register::<S>))
        .route("/activation", post(handlers::activation::<S>))
        .route(
            "/activate/{uid}/{token}",
            get(handlers::activate_link::<S>),
        )
        .route("/resend_activation", post(handlers::resend_activation::<S>))
        .route("/{id}", get(handlers::get_user::<S>))
        .with_state(state)
}

/// Session routes, nested under `/api/auth`
pub fn auth_router<S: UsersServices>(state: UsersAppState<S>) -> Router {
    Router::new()
        .route("/signin", post(handlers::sign_in::<S>))
        .route("/signout", post(handlers::sign_out::<S>))
        .with_state(state)
}

/// Both route groups at their mount points
pub fn accounts_router<S: UsersServices>(state: UsersAppState<S>) -> Router {
    Router::new()
        .nest("/api/auth/users", users_router(state.clone()))
        .nest("/api/auth", auth_router(state))
}

/// `/api/auth/users/vendor/` routes like `/api/auth/users/vendor`.
///
/// Must wrap the whole app: a layer added with `Router::layer` runs after
/// routing and cannot change which route matches.
pub fn trim_trailing_slash(app: Router) -> NormalizePath<Router> {
    NormalizePath::trim_trailing_slash(app)
}
