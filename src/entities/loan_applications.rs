use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "loan_applications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: String,

    /// Decimal string with at most two fractional digits
    pub amount_requested: String,

    pub purpose: String,

    /// One of "pending", "approved", "rejected", "flagged"
    pub status: String,

    pub date_applied: String,

    pub date_updated: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,

    #[sea_orm(has_many = "super::fraud_flags::Entity")]
    FraudFlags,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::fraud_flags::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FraudFlags.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
