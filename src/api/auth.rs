use axum::{
    Extension, Json,
    extract::{Request, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::validation::read_json;
use super::{ApiError, AppState, LoginRequest, MessageResponse, RefreshRequest, RegistrationRequest};
use crate::domain::Caller;
use crate::services::auth_service::CREDENTIALS_NOT_PROVIDED;
use crate::services::{AuthError, Credentials, Registration, TokenPair};

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(errors) => Self::Validation(errors),
            AuthError::TokenNotValid(detail) => Self::token_not_valid(detail),
            AuthError::NotAuthenticated(detail) => Self::unauthorized(detail),
            AuthError::Database(msg) => Self::DatabaseError(msg),
            AuthError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// Resolves `Authorization: Bearer <access token>` to a [`Caller`] and
/// stores it in the request extensions.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized(CREDENTIALS_NOT_PROVIDED))?;

    let caller = state.auth_service.authenticate(&token).await?;

    tracing::Span::current().record("user_id", tracing::field::display(caller.id));
    request.extensions_mut().insert(caller);

    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /account/registration/
pub async fn register(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RegistrationRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = read_json(body)?;

    state
        .auth_service
        .register(Registration {
            email: payload.email,
            first_name: payload.first_name,
            last_name: payload.last_name,
            password: payload.password,
            password2: payload.password2,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Registration successful")),
    ))
}

/// POST /account/login/
pub async fn login(
    State(state): State<Arc<AppState>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenPair>, ApiError> {
    let payload = read_json(body)?;

    let pair = state
        .auth_service
        .login(Credentials {
            email: payload.email,
            password: payload.password,
        })
        .await?;

    Ok(Json(pair))
}

/// POST /account/token/refresh/
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<TokenPair>, ApiError> {
    let payload = read_json(body)?;
    let pair = state.auth_service.refresh(payload.refresh).await?;
    Ok(Json(pair))
}

/// POST /account/logout/
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    body: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let payload = read_json(body)?;
    state.auth_service.logout(payload.refresh).await?;

    tracing::info!(user_id = %caller.id, email = %caller.email, "User logged out");
    Ok(Json(MessageResponse::new("Successfully logged out")))
}
