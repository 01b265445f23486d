use sea_orm::entity::prelude::*;

/// Refresh tokens that may no longer be exchanged, keyed by their `jti` claim.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "blacklisted_tokens")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub jti: String,

    pub user_id: String,

    pub expires_at: String,

    pub blacklisted_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
