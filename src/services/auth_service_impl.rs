//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::config::{Config, JwtConfig, SecurityConfig};
use crate::db::{Store, is_unique_violation};
use crate::domain::validation::{
    NON_FIELD_ERRORS, REQUIRED, validate_email, validate_name, validate_password,
};
use crate::domain::{Caller, FieldErrors};
use crate::models::user::{NewUser, User};
use crate::services::auth_service::{
    AuthError, AuthService, Credentials, Registration, TOKEN_BLACKLISTED, TOKEN_INVALID,
    TOKEN_NOT_VALID_FOR_ANY_TYPE, USER_INACTIVE, USER_NOT_FOUND,
};
use crate::services::token::{Claims, JwtService, TokenError, TokenPair, TokenType};

pub struct SeaOrmAuthService {
    store: Store,
    jwt: JwtService,
    jwt_config: JwtConfig,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub fn new(store: Store, config: &Config) -> Self {
        Self {
            store,
            jwt: JwtService::new(&config.jwt),
            jwt_config: config.jwt.clone(),
            security: config.security.clone(),
        }
    }

    async fn validate_registration(&self, registration: Registration) -> Result<NewUser, AuthError> {
        let mut errors = FieldErrors::new();

        let email = errors.check("email", validate_email(registration.email.as_deref()));
        let first_name =
            errors.check("first_name", validate_name(registration.first_name.as_deref()));
        let last_name = errors.check("last_name", validate_name(registration.last_name.as_deref()));
        let password = errors.check("password", required(registration.password));
        let password2 = errors.check("password2", required(registration.password2));

        if let Some(email) = &email {
            if self.store.email_exists(email).await? {
                errors.add("email", DUPLICATE_EMAIL);
            }
        }

        if let Some(password) = &password {
            let mut attributes = Vec::new();
            if let Some(email) = &email {
                attributes.push(("email", email.as_str()));
            }
            if let Some(first_name) = &first_name {
                attributes.push(("first name", first_name.as_str()));
            }
            if let Some(last_name) = &last_name {
                attributes.push(("last name", last_name.as_str()));
            }

            for problem in
                validate_password(password, self.security.min_password_length, &attributes)
            {
                errors.add("password", problem);
            }
        }

        errors.into_result()?;

        let (Some(email), Some(first_name), Some(last_name), Some(password), Some(password2)) =
            (email, first_name, last_name, password, password2)
        else {
            return Err(AuthError::Internal(
                "registration passed validation with missing fields".to_string(),
            ));
        };

        if password != password2 {
            return Err(FieldErrors::single("password", "Passwords do not match.").into());
        }

        Ok(NewUser {
            email,
            first_name,
            last_name,
            password,
            ..NewUser::default()
        })
    }

    /// Decodes a refresh token and rejects revoked ones.
    async fn verify_refresh(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = self.jwt.decode(token, TokenType::Refresh)?;
        if self.store.is_token_blacklisted(&claims.jti).await? {
            return Err(AuthError::TokenNotValid(TOKEN_BLACKLISTED));
        }
        Ok(claims)
    }

    async fn active_user(&self, claims: &Claims) -> Result<User, AuthError> {
        let user_id = claims.user_id()?;
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or(AuthError::NotAuthenticated(USER_NOT_FOUND))?;

        if !user.is_active {
            return Err(AuthError::NotAuthenticated(USER_INACTIVE));
        }
        Ok(user)
    }
}

const DUPLICATE_EMAIL: &str = "A user with this email already exists.";

/// Inserts the account. A concurrent registration that won the unique index
/// is reported as the same field error as the up-front check.
async fn insert_user(
    store: &Store,
    new_user: NewUser,
    security: &SecurityConfig,
) -> Result<User, AuthError> {
    store.create_user(new_user, security).await.map_err(|e| {
        if is_unique_violation(&e) {
            AuthError::from(FieldErrors::single("email", DUPLICATE_EMAIL))
        } else {
            AuthError::from(e)
        }
    })
}

fn required(value: Option<String>) -> Result<String, String> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(REQUIRED.to_string()),
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(&self, registration: Registration) -> Result<User, AuthError> {
        let new_user = self.validate_registration(registration).await?;
        let user = insert_user(&self.store, new_user, &self.security).await?;

        info!(user_id = %user.id, email = %user.email, "New user registered");
        Ok(user)
    }

    async fn create_superuser(&self, registration: Registration) -> Result<User, AuthError> {
        let new_user = self.validate_registration(registration).await?;
        let user = insert_user(
            &self.store,
            NewUser {
                is_staff: true,
                is_superuser: true,
                ..new_user
            },
            &self.security,
        )
        .await?;

        info!(user_id = %user.id, email = %user.email, "Superuser created");
        Ok(user)
    }

    async fn login(&self, credentials: Credentials) -> Result<TokenPair, AuthError> {
        let mut errors = FieldErrors::new();
        let email = errors.check("email", validate_email(credentials.email.as_deref()));
        let password = errors.check("password", required(credentials.password));
        errors.into_result()?;

        let (Some(email), Some(password)) = (email, password) else {
            return Err(AuthError::Internal(
                "login passed validation with missing fields".to_string(),
            ));
        };

        let user = self
            .store
            .verify_user_password(&email, &password)
            .await?
            .ok_or_else(|| FieldErrors::single(NON_FIELD_ERRORS, "Invalid credentials."))?;

        if !user.is_active {
            return Err(FieldErrors::single(NON_FIELD_ERRORS, "User account is disabled.").into());
        }
        if !user.is_verified {
            return Err(FieldErrors::single(NON_FIELD_ERRORS, "Email is not verified.").into());
        }

        let pair = self.jwt.issue_pair(user.id)?;
        info!(user_id = %user.id, "User logged in");
        Ok(pair)
    }

    async fn refresh(&self, refresh: Option<String>) -> Result<TokenPair, AuthError> {
        let token = required(refresh).map_err(|msg| FieldErrors::single("refresh", msg))?;

        let claims = self.verify_refresh(&token).await?;
        let user = self.active_user(&claims).await?;

        if !self.jwt_config.rotate_refresh_tokens {
            return Ok(TokenPair {
                access: self.jwt.issue(user.id, TokenType::Access)?,
                refresh: token,
            });
        }

        if self.jwt_config.blacklist_after_rotation {
            self.store
                .blacklist_token(&claims.jti, user.id, &claims.expires_at())
                .await?;
        }

        let pair = self.jwt.issue_pair(user.id)?;
        info!(user_id = %user.id, "Refresh token rotated");
        Ok(pair)
    }

    async fn logout(&self, refresh: Option<String>) -> Result<(), AuthError> {
        let Some(token) = refresh else {
            return Err(FieldErrors::single("refresh", REQUIRED).into());
        };
        if token.trim().is_empty() {
            return Err(FieldErrors::single("refresh", "Refresh token cannot be empty").into());
        }

        let invalid = || FieldErrors::single("refresh", "Invalid or expired refresh token");
        let claims = match self.verify_refresh(token.trim()).await {
            Ok(claims) => claims,
            Err(AuthError::TokenNotValid(_)) => return Err(invalid().into()),
            Err(e) => return Err(e),
        };
        let user_id = claims.user_id().map_err(|_| invalid())?;

        self.store
            .blacklist_token(&claims.jti, user_id, &claims.expires_at())
            .await?;

        info!(user_id = %user_id, "Refresh token blacklisted on logout");
        Ok(())
    }

    async fn authenticate(&self, access: &str) -> Result<Caller, AuthError> {
        let claims = self.jwt.decode(access, TokenType::Access).map_err(|e| match e {
            TokenError::Invalid | TokenError::WrongType => {
                AuthError::TokenNotValid(TOKEN_NOT_VALID_FOR_ANY_TYPE)
            }
            TokenError::Signing(msg) => AuthError::Internal(msg),
        })?;

        let user = self.active_user(&claims).await.map_err(|e| match e {
            AuthError::TokenNotValid(TOKEN_INVALID) => {
                AuthError::TokenNotValid(TOKEN_NOT_VALID_FOR_ANY_TYPE)
            }
            other => other,
        })?;

        Ok(Caller::from(&user))
    }
}
