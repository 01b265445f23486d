use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LoanApplications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LoanApplications::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LoanApplications::UserId).string().not_null())
                    .col(
                        ColumnDef::new(LoanApplications::AmountRequested)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LoanApplications::Purpose)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LoanApplications::Status)
                            .string_len(10)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(LoanApplications::DateApplied)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LoanApplications::DateUpdated)
                            .string()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_loan_applications_user_id")
                            .from(LoanApplications::Table, LoanApplications::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Velocity checks filter on (user_id, date_applied)
        manager
            .create_index(
                Index::create()
                    .name("idx_loan_applications_user_date")
                    .table(LoanApplications::Table)
                    .col(LoanApplications::UserId)
                    .col(LoanApplications::DateApplied)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_loan_applications_status")
                    .table(LoanApplications::Table)
                    .col(LoanApplications::Status)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FraudFlags::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FraudFlags::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(FraudFlags::LoanApplicationId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(FraudFlags::Reason).text().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_fraud_flags_loan_application_id")
                            .from(FraudFlags::Table, FraudFlags::LoanApplicationId)
                            .to(LoanApplications::Table, LoanApplications::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FraudFlags::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LoanApplications::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum LoanApplications {
    Table,
    Id,
    UserId,
    AmountRequested,
    Purpose,
    Status,
    DateApplied,
    DateUpdated,
}

#[derive(DeriveIden)]
enum FraudFlags {
    Table,
    Id,
    LoanApplicationId,
    Reason,
}
