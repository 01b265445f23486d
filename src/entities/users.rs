use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// UUID v4, hyphenated
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Always stored lower-cased
    #[sea_orm(unique)]
    pub email: String,

    pub first_name: String,

    pub last_name: String,

    /// Argon2id password hash
    pub password_hash: String,

    pub is_active: bool,

    pub is_verified: bool,

    /// Grants access to the admin loan routes.
    pub is_staff: bool,

    /// Receives flagged-loan alerts.
    pub is_superuser: bool,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::loan_applications::Entity")]
    LoanApplications,
}

impl Related<super::loan_applications::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LoanApplications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
