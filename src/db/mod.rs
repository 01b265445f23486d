use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, SqlErr, Statement,
};
use std::path::Path;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::domain::LoanId;
use crate::models::loan::{FraudFlag, LoanApplication, LoanRecord, LoanStatus};
use crate::models::user::{NewUser, User};

pub mod migrator;
pub mod repositories;

/// Fixed-width UTC timestamp so that string order matches time order.
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[must_use]
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

/// True when a store call failed on a unique index, e.g. a duplicate email.
#[must_use]
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<DbErr>()
        .and_then(DbErr::sql_err)
        .is_some_and(|e| matches!(e, SqlErr::UniqueConstraintViolation(_)))
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let path_str = db_url.trim_start_matches("sqlite:");
        let in_memory = path_str.starts_with(":memory:");
        if !in_memory {
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        // Every in-memory connection is its own database.
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn loan_repo(&self) -> repositories::loan::LoanRepository {
        repositories::loan::LoanRepository::new(self.conn.clone())
    }

    fn token_repo(&self) -> repositories::token::TokenRepository {
        repositories::token::TokenRepository::new(self.conn.clone())
    }

    pub async fn create_user(&self, new_user: NewUser, security: &SecurityConfig) -> Result<User> {
        self.user_repo().create(new_user, security).await
    }

    pub async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        self.user_repo().email_exists(email).await
    }

    pub async fn verify_user_password(&self, email: &str, password: &str) -> Result<Option<User>> {
        self.user_repo().verify_password(email, password).await
    }

    pub async fn count_users_with_email_domain(&self, domain: &str) -> Result<u64> {
        self.user_repo().count_by_email_domain(domain).await
    }

    pub async fn superuser_emails(&self) -> Result<Vec<String>> {
        self.user_repo().superuser_emails().await
    }

    pub async fn set_user_flags(&self, id: Uuid, is_active: bool, is_verified: bool) -> Result<()> {
        self.user_repo().set_flags(id, is_active, is_verified).await
    }

    pub async fn create_loan(
        &self,
        user_id: Uuid,
        amount: Decimal,
        purpose: &str,
    ) -> Result<LoanApplication> {
        self.loan_repo().create(user_id, amount, purpose).await
    }

    pub async fn get_loan(&self, id: LoanId) -> Result<Option<LoanApplication>> {
        self.loan_repo().get(id).await
    }

    pub async fn count_loans_applied_since(&self, user_id: Uuid, since: &str) -> Result<u64> {
        self.loan_repo().count_applied_since(user_id, since).await
    }

    pub async fn flag_loan(&self, id: LoanId, reasons: &[String]) -> Result<Vec<FraudFlag>> {
        self.loan_repo().flag(id, reasons).await
    }

    pub async fn get_fraud_flags(&self, id: LoanId) -> Result<Vec<FraudFlag>> {
        self.loan_repo().flags_for(id).await
    }

    pub async fn update_loan_status(
        &self,
        id: LoanId,
        status: LoanStatus,
    ) -> Result<Option<LoanApplication>> {
        self.loan_repo().update_status(id, status).await
    }

    pub async fn list_user_loans(
        &self,
        user_id: Uuid,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<LoanRecord>, u64)> {
        self.loan_repo().list_for_user(user_id, limit, offset).await
    }

    pub async fn list_flagged_loans(&self, limit: u64, offset: u64) -> Result<(Vec<LoanRecord>, u64)> {
        self.loan_repo().list_flagged(limit, offset).await
    }

    pub async fn blacklist_token(&self, jti: &str, user_id: Uuid, expires_at: &str) -> Result<()> {
        self.token_repo().blacklist(jti, user_id, expires_at).await
    }

    pub async fn is_token_blacklisted(&self, jti: &str) -> Result<bool> {
        self.token_repo().is_blacklisted(jti).await
    }

    pub async fn prune_expired_tokens(&self) -> Result<u64> {
        self.token_repo().prune_expired().await
    }
}
