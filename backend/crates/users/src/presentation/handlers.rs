//! HTTP Handlers

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum_extra::extract::WithRejection;
use std::sync::Arc;

use kernel::id::UserId;

use crate::application::config::UsersConfig;
use crate::application::{
    ActivateUserUseCase, ActivationForm, ConfirmPhoneVerificationUseCase, PhoneRegisterForm,
    PhoneVerifyForm, RegisterUseCase, RegistrationForm, RegistrationKind, ResendActivationForm,
    ResendActivationUseCase, SignInInput, SignInUseCase, SignOutUseCase,
    StartPhoneVerificationUseCase, UsersQueryUseCase,
};
use crate::domain::gateway::{ActivationGateway, ActivationOutcome, Mailer, VerificationProvider};
use crate::domain::repository::UsersStore;
use crate::error::{UsersError, UsersResult};
use crate::presentation::dto::{SignInRequest, SignInResponse, UserCreatedResponse, UserResponse};
use crate::presentation::middleware::{Client, CurrentUser};

/// Collaborators the handlers are generic over
pub trait UsersServices: Send + Sync + 'static {
    type Store: UsersStore;
    type Provider: VerificationProvider + Send + Sync + 'static;
    type Mailer: Mailer + Send + Sync + 'static;
    type Gateway: ActivationGateway + Send + Sync + 'static;
}

/// Shared state for users handlers
pub struct UsersAppState<S: UsersServices> {
    pub store: Arc<S::Store>,
    pub provider: Arc<S::Provider>,
    pub mailer: Arc<S::Mailer>,
    pub gateway: Arc<S::Gateway>,
    pub config: Arc<UsersConfig>,
}

impl<S: UsersServices> UsersAppState<S> {
    pub fn new(
        store: S::Store,
        provider: S::Provider,
        mailer: S::Mailer,
        gateway: S::Gateway,
        config: UsersConfig,
    ) -> Self {
        Self {
            store: Arc::new(store),
            provider: Arc::new(provider),
            mailer: Arc::new(mailer),
            gateway: Arc::new(gateway),
            config: Arc::new(config),
        }
    }
}

impl<S: UsersServices> Clone for UsersAppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            provider: self.provider.clone(),
            mailer: self.mailer.clone(),
            gateway: self.gateway.clone(),
            config: self.config.clone(),
        }
    }
}

type JsonBody<T> = WithRejection<Json<T>, UsersError>;

fn request_host(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::HOST).and_then(|v| v.to_str().ok())
}

// ============================================================================
// Registration
// ============================================================================

/// POST /api/auth/users
pub async fn register<S: UsersServices>(
    State(state): State<UsersAppState<S>>,
    headers: HeaderMap,
    WithRejection(Json(form), _): JsonBody<RegistrationForm>,
) -> UsersResult<impl IntoResponse> {
    register_as(state, &headers, form, RegistrationKind::Base).await
}

/// POST /api/auth/users/vendor
pub async fn register_vendor<S: UsersServices>(
    State(state): State<UsersAppState<S>>,
    headers: HeaderMap,
    WithRejection(Json(form), _): JsonBody<RegistrationForm>,
) -> UsersResult<impl IntoResponse> {
    register_as(state, &headers, form, RegistrationKind::Vendor).await
}

async fn register_as<S: UsersServices>(
    state: UsersAppState<S>,
    headers: &HeaderMap,
    form: RegistrationForm,
    kind: RegistrationKind,
) -> UsersResult<(StatusCode, Json<UserCreatedResponse>)> {
    let use_case = RegisterUseCase::new(state.store.clone(), state.mailer.clone(), state.config.clone());
    let user = use_case.execute(form, kind, request_host(headers)).await?;

    Ok((StatusCode::CREATED, Json(UserCreatedResponse::from(&user))))
}

// ============================================================================
// Users
// ============================================================================

/// GET /api/auth/users
pub async fn list_users<S: UsersServices>(
    State(state): State<UsersAppState<S>>,
    current: CurrentUser,
) -> UsersResult<Json<Vec<UserResponse>>> {
    let users = UsersQueryUseCase::new(state.store.clone())
        .list(&current.user)
        .await?;

    Ok(Json(users.iter().map(UserResponse::from).collect()))
}

/// GET /api/auth/users/me
pub async fn me(current: CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from(&current.user))
}

/// GET /api/auth/users/{id}
pub async fn get_user<S: UsersServices>(
    State(state): State<UsersAppState<S>>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> UsersResult<Json<UserResponse>> {
    let user_id = UserId::parse_str(&id).ok_or(UsersError::NotFound)?;
    let user = UsersQueryUseCase::new(state.store.clone())
        .get(&current.user, &user_id)
        .await?;

    Ok(Json(UserResponse::from(&user)))
}

// ============================================================================
// Phone Verification
// ============================================================================

/// POST /api/auth/users/phone-verify
pub async fn phone_verify<S: UsersServices>(
    State(state): State<UsersAppState<S>>,
    WithRejection(Json(form), _): JsonBody<PhoneVerifyForm>,
) -> UsersResult<StatusCode> {
    StartPhoneVerificationUseCase::new(state.provider.clone())
        .execute(form)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/auth/users/phone-register
pub async fn phone_register<S: UsersServices>(
    State(state): State<UsersAppState<S>>,
    WithRejection(Json(form), _): JsonBody<PhoneRegisterForm>,
) -> UsersResult<StatusCode> {
    ConfirmPhoneVerificationUseCase::new(state.store.clone(), state.provider.clone())
        .execute(form)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Activation
// ============================================================================

/// POST /api/auth/users/activation
pub async fn activation<S: UsersServices>(
    State(state): State<UsersAppState<S>>,
    WithRejection(Json(form), _): JsonBody<ActivationForm>,
) -> UsersResult<StatusCode> {
    ActivateUserUseCase::new(state.store.clone(), state.store.clone(), state.config.clone())
        .execute(form)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/auth/users/activate/{uid}/{token}
///
/// Target of the emailed link; forwards to the POST endpoint over HTTP.
/// The forward target comes from configuration only.
pub async fn activate_link<S: UsersServices>(
    State(state): State<UsersAppState<S>>,
    Path((uid, token)): Path<(String, String)>,
) -> UsersResult<StatusCode> {
    let base_url = state.config.activation_proxy_base_url();

    match state.gateway.activate(&base_url, &uid, &token).await {
        ActivationOutcome::Activated => Ok(StatusCode::NO_CONTENT),
        ActivationOutcome::Failed { upstream } => {
            Err(UsersError::ActivationUnavailable { upstream })
        }
    }
}

/// POST /api/auth/users/resend_activation
pub async fn resend_activation<S: UsersServices>(
    State(state): State<UsersAppState<S>>,
    headers: HeaderMap,
    WithRejection(Json(form), _): JsonBody<ResendActivationForm>,
) -> UsersResult<StatusCode> {
    ResendActivationUseCase::new(state.store.clone(), state.mailer.clone(), state.config.clone())
        .execute(form, request_host(&headers))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Sign In / Sign Out
// ============================================================================

/// POST /api/auth/signin
pub async fn sign_in<S: UsersServices>(
    State(state): State<UsersAppState<S>>,
    Client(fingerprint): Client,
    WithRejection(Json(req), _): JsonBody<SignInRequest>,
) -> UsersResult<impl IntoResponse> {
    let use_case = SignInUseCase::new(
        state.store.clone(),
        state.store.clone(),
        state.store.clone(),
        state.config.clone(),
    );

    let input = SignInInput {
        email: req.email,
        password: req.password,
        remember_me: req.remember_me,
    };

    let output = use_case.execute(input, fingerprint).await?;

    // Max-Age follows remember_me
    let cookie = state
        .config
        .cookie()
        .build_set_cookie(&output.session_token, output.max_age_secs);

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(SignInResponse {
            user: UserResponse::from(&output.user),
        }),
    ))
}

/// POST /api/auth/signout
pub async fn sign_out<S: UsersServices>(
    State(state): State<UsersAppState<S>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let cookie_config = state.config.cookie();

    if let Some(token) = cookie_config.extract(&headers) {
        let use_case = SignOutUseCase::new(state.store.clone(), state.config.clone());
        // Ignore errors - just clear the cookie
        let _ = use_case.execute(&token).await;
    }

    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, cookie_config.build_delete_cookie())],
    )
}
