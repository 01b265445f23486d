use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BlacklistedTokens::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BlacklistedTokens::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(BlacklistedTokens::Jti)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(BlacklistedTokens::UserId).string().not_null())
                    .col(
                        ColumnDef::new(BlacklistedTokens::ExpiresAt)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BlacklistedTokens::BlacklistedAt)
                            .string()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BlacklistedTokens::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum BlacklistedTokens {
    Table,
    Id,
    Jti,
    UserId,
    ExpiresAt,
    BlacklistedAt,
}
