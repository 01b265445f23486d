use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set,
    sea_query::OnConflict,
};
use uuid::Uuid;

use crate::db::now_timestamp;
use crate::entities::{blacklisted_tokens, prelude::*};

pub struct TokenRepository {
    conn: DatabaseConnection,
}

impl TokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Records the token id as revoked. Re-blacklisting the same id is a no-op.
    pub async fn blacklist(&self, jti: &str, user_id: Uuid, expires_at: &str) -> Result<()> {
        let model = blacklisted_tokens::ActiveModel {
            jti: Set(jti.to_string()),
            user_id: Set(user_id.to_string()),
            expires_at: Set(expires_at.to_string()),
            blacklisted_at: Set(now_timestamp()),
            ..Default::default()
        };

        BlacklistedTokens::insert(model)
            .on_conflict(
                OnConflict::column(blacklisted_tokens::Column::Jti)
                    .do_nothing()
                    .to_owned(),
            )
            .do_nothing()
            .exec(&self.conn)
            .await
            .context("Failed to blacklist token")?;

        Ok(())
    }

    pub async fn is_blacklisted(&self, jti: &str) -> Result<bool> {
        let count = BlacklistedTokens::find()
            .filter(blacklisted_tokens::Column::Jti.eq(jti))
            .count(&self.conn)
            .await
            .context("Failed to query token blacklist")?;

        Ok(count > 0)
    }

    /// Drops entries for tokens that have expired anyway.
    pub async fn prune_expired(&self) -> Result<u64> {
        let result = BlacklistedTokens::delete_many()
            .filter(blacklisted_tokens::Column::ExpiresAt.lt(now_timestamp()))
            .exec(&self.conn)
            .await
            .context("Failed to prune expired blacklist entries")?;

        Ok(result.rows_affected)
    }
}
