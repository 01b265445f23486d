use sea_orm_migration::prelude::*;

mod m20250601_create_users;
mod m20250602_create_loan_applications;
mod m20250610_create_blacklisted_tokens;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_create_users::Migration),
            Box::new(m20250602_create_loan_applications::Migration),
            Box::new(m20250610_create_blacklisted_tokens::Migration),
        ]
    }
}
