//! Session Guard
//!
//! Extractors resolving the session cookie to the signed-in user.

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use platform::client::{ClientFingerprint, extract_client_ip, extract_fingerprint};
use std::net::SocketAddr;

use crate::application::{CheckSessionUseCase, UsersQueryUseCase};
use crate::domain::entity::{AuthSession, User};
use crate::error::UsersError;
use crate::presentation::handlers::{UsersAppState, UsersServices};

/// Fingerprint of the calling client
///
/// The peer address is optional so the router also works without
/// `into_make_service_with_connect_info`.
pub fn client_fingerprint(parts: &Parts) -> Result<ClientFingerprint, UsersError> {
    let direct_ip = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip());
    let client_ip = extract_client_ip(&parts.headers, direct_ip);
    Ok(extract_fingerprint(&parts.headers, client_ip)?)
}

/// Client fingerprint as an extractor
pub struct Client(pub ClientFingerprint);

impl<S> FromRequestParts<S> for Client
where
    S: Send + Sync,
{
    type Rejection = UsersError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        client_fingerprint(parts).map(Client)
    }
}

/// The signed-in user, required by protected routes
pub struct CurrentUser {
    pub user: User,
    pub session: AuthSession,
}

impl<S> FromRequestParts<UsersAppState<S>> for CurrentUser
where
    S: UsersServices,
{
    type Rejection = UsersError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &UsersAppState<S>,
    ) -> Result<Self, Self::Rejection> {
        let fingerprint = client_fingerprint(parts)?;
        let token = state
            .config
            .cookie()
            .extract(&parts.headers)
            .ok_or(UsersError::SessionInvalid)?;

        let session = CheckSessionUseCase::new(state.store.clone(), state.config.clone())
            .get_session(&token, &fingerprint.hash)
            .await?;

        let user = UsersQueryUseCase::new(state.store.clone())
            .current(&session.user_id)
            .await?;

        if !user.is_active {
            return Err(UsersError::SessionInvalid);
        }

        Ok(CurrentUser { user, session })
    }
}
