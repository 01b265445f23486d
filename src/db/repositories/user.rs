use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use tokio::task;
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::db::now_timestamp;
use crate::entities::{prelude::*, users};
use crate::models::user::{NewUser, User};

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Hashes the password and inserts the account. The email is lower-cased.
    pub async fn create(&self, new_user: NewUser, security: &SecurityConfig) -> Result<User> {
        let password = new_user.password;
        let security = security.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, Some(&security)))
            .await
            .context("Password hashing task panicked")??;

        let now = now_timestamp();
        let model = users::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            email: Set(new_user.email.to_lowercase()),
            first_name: Set(new_user.first_name),
            last_name: Set(new_user.last_name),
            password_hash: Set(password_hash),
            is_active: Set(true),
            is_verified: Set(true),
            is_staff: Set(new_user.is_staff),
            is_superuser: Set(new_user.is_superuser),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert user")?;

        User::try_from(model)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let user = Users::find_by_id(id.to_string())
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        user.map(User::try_from).transpose()
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::Email.eq(email.to_lowercase()))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        user.map(User::try_from).transpose()
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let count = Users::find()
            .filter(users::Column::Email.eq(email.to_lowercase()))
            .count(&self.conn)
            .await
            .context("Failed to check for existing email")?;

        Ok(count > 0)
    }

    /// Returns the user when the password matches, `None` otherwise.
    /// Argon2 verification runs on the blocking pool.
    pub async fn verify_password(&self, email: &str, password: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::Email.eq(email.to_lowercase()))
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let Some(user) = user else {
            return Ok(None);
        };

        let password_hash = user.password_hash.clone();
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            Ok::<bool, anyhow::Error>(
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        if is_valid {
            Ok(Some(User::try_from(user)?))
        } else {
            Ok(None)
        }
    }

    /// Counts accounts whose email ends with `@domain`, ignoring case.
    ///
    /// The suffix becomes an unescaped `LIKE` pattern. Registration only
    /// accepts letters, digits, `-` and `.` in domains, so it never carries
    /// `%` or `_`.
    pub async fn count_by_email_domain(&self, domain: &str) -> Result<u64> {
        let suffix = format!("@{}", domain.to_lowercase());
        Users::find()
            .filter(users::Column::Email.ends_with(&suffix))
            .count(&self.conn)
            .await
            .context("Failed to count users by email domain")
    }

    pub async fn superuser_emails(&self) -> Result<Vec<String>> {
        let admins = Users::find()
            .filter(users::Column::IsSuperuser.eq(true))
            .filter(users::Column::Email.ne(""))
            .order_by_asc(users::Column::Email)
            .all(&self.conn)
            .await
            .context("Failed to query superusers")?;

        Ok(admins.into_iter().map(|u| u.email).collect())
    }

    pub async fn set_flags(&self, id: Uuid, is_active: bool, is_verified: bool) -> Result<()> {
        let user = Users::find_by_id(id.to_string())
            .one(&self.conn)
            .await
            .context("Failed to query user for update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {id}"))?;

        let mut active: users::ActiveModel = user.into();
        active.is_active = Set(is_active);
        active.is_verified = Set(is_verified);
        active.updated_at = Set(now_timestamp());
        active.update(&self.conn).await?;

        Ok(())
    }
}

/// Hash a password using Argon2id with optional custom params.
/// If config is None, uses the library default params.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}
