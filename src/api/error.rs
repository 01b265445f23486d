use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::domain::FieldErrors;

pub const NOT_FOUND: &str = "Not found.";
pub const SERVER_ERROR: &str = "A server error occurred.";
pub const TOKEN_NOT_VALID_CODE: &str = "token_not_valid";

#[derive(Debug)]
pub enum ApiError {
    /// 400 with `{field: [messages]}`.
    Validation(FieldErrors),

    /// 400 with `{detail}`, for bodies that could not be read at all.
    BadRequest(String),

    /// 401 with `{detail}` and an optional machine-readable `code`.
    Unauthorized {
        detail: String,
        code: Option<&'static str>,
    },

    Forbidden(String),

    NotFound,

    DatabaseError(String),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(errors) => write!(f, "Validation error: {errors}"),
            Self::BadRequest(msg) => write!(f, "Bad request: {msg}"),
            Self::Unauthorized { detail, .. } => write!(f, "Unauthorized: {detail}"),
            Self::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
            Self::NotFound => f.write_str(NOT_FOUND),
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::InternalError(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(errors) => (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
            Self::BadRequest(detail) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "detail": detail }))).into_response()
            }
            Self::Unauthorized { detail, code } => {
                let body = match code {
                    Some(code) => json!({ "detail": detail, "code": code }),
                    None => json!({ "detail": detail }),
                };
                (StatusCode::UNAUTHORIZED, Json(body)).into_response()
            }
            Self::Forbidden(detail) => {
                (StatusCode::FORBIDDEN, Json(json!({ "detail": detail }))).into_response()
            }
            Self::NotFound => {
                (StatusCode::NOT_FOUND, Json(json!({ "detail": NOT_FOUND }))).into_response()
            }
            Self::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                server_error()
            }
            Self::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                server_error()
            }
        }
    }
}

fn server_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "detail": SERVER_ERROR })),
    )
        .into_response()
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError(format!("{err:#}"))
    }
}

impl From<FieldErrors> for ApiError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

impl ApiError {
    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::Unauthorized {
            detail: detail.into(),
            code: None,
        }
    }

    pub fn token_not_valid(detail: impl Into<String>) -> Self {
        Self::Unauthorized {
            detail: detail.into(),
            code: Some(TOKEN_NOT_VALID_CODE),
        }
    }

    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation(FieldErrors::single(field, message))
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }
}
