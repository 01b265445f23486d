//! Domain service for accounts and credentials.
//!
//! Handles registration, login, token refresh and logout, and resolves
//! access tokens to the calling user.

use thiserror::Error;

use crate::domain::{Caller, FieldErrors};
use crate::models::user::User;
use crate::services::token::{TokenError, TokenPair};

pub const TOKEN_INVALID: &str = "Token is invalid or expired";
pub const TOKEN_BLACKLISTED: &str = "Token is blacklisted";
pub const TOKEN_NOT_VALID_FOR_ANY_TYPE: &str = "Given token not valid for any token type";
pub const CREDENTIALS_NOT_PROVIDED: &str = "Authentication credentials were not provided.";
pub const USER_NOT_FOUND: &str = "User not found";
pub const USER_INACTIVE: &str = "User is inactive";

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Rejected input, reported per field.
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// A JWT that failed verification, was of the wrong type, or was revoked.
    #[error("{0}")]
    TokenNotValid(&'static str),

    #[error("{0}")]
    NotAuthenticated(&'static str),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

impl From<FieldErrors> for AuthError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid | TokenError::WrongType => Self::TokenNotValid(TOKEN_INVALID),
            TokenError::Signing(msg) => Self::Internal(msg),
        }
    }
}

/// Raw registration payload. Every field is optional so that missing ones
/// are reported alongside the other field errors.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
    pub password2: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Validates and creates a regular account.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] with every failing field.
    async fn register(&self, registration: Registration) -> Result<User, AuthError>;

    /// Validates and creates a staff superuser account.
    async fn create_superuser(&self, registration: Registration) -> Result<User, AuthError>;

    /// Checks credentials and issues an access/refresh pair.
    async fn login(&self, credentials: Credentials) -> Result<TokenPair, AuthError>;

    /// Exchanges a refresh token for a new pair, revoking the old one.
    async fn refresh(&self, refresh: Option<String>) -> Result<TokenPair, AuthError>;

    /// Revokes the given refresh token.
    async fn logout(&self, refresh: Option<String>) -> Result<(), AuthError>;

    /// Resolves an access token to the user it was issued for.
    async fn authenticate(&self, access: &str) -> Result<Caller, AuthError>;
}
