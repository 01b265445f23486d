use anyhow::{Context, Result};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, LoaderTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::db::now_timestamp;
use crate::domain::LoanId;
use crate::entities::{fraud_flags, loan_applications, prelude::*, users};
use crate::models::loan::{FraudFlag, LoanApplication, LoanRecord, LoanStatus};
use crate::models::user::User;

pub struct LoanRepository {
    conn: DatabaseConnection,
}

impl LoanRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Inserts a new application with status `pending`.
    pub async fn create(
        &self,
        user_id: Uuid,
        amount: Decimal,
        purpose: &str,
    ) -> Result<LoanApplication> {
        let now = now_timestamp();
        let model = loan_applications::ActiveModel {
            user_id: Set(user_id.to_string()),
            amount_requested: Set(amount.to_string()),
            purpose: Set(purpose.to_string()),
            status: Set(LoanStatus::Pending.as_str().to_string()),
            date_applied: Set(now.clone()),
            date_updated: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert loan application")?;

        LoanApplication::try_from(model)
    }

    pub async fn get(&self, id: LoanId) -> Result<Option<LoanApplication>> {
        let loan = LoanApplications::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query loan application")?;

        loan.map(LoanApplication::try_from).transpose()
    }

    /// Counts the user's applications dated at or after `since`.
    pub async fn count_applied_since(&self, user_id: Uuid, since: &str) -> Result<u64> {
        LoanApplications::find()
            .filter(loan_applications::Column::UserId.eq(user_id.to_string()))
            .filter(loan_applications::Column::DateApplied.gte(since))
            .count(&self.conn)
            .await
            .context("Failed to count recent loan applications")
    }

    /// Marks the loan as flagged and stores one fraud flag per reason, atomically.
    pub async fn flag(&self, id: LoanId, reasons: &[String]) -> Result<Vec<FraudFlag>> {
        let txn = self.conn.begin().await?;

        let loan = LoanApplications::find_by_id(id.value())
            .one(&txn)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Loan application {id} not found"))?;

        let mut active: loan_applications::ActiveModel = loan.into();
        active.status = Set(LoanStatus::Flagged.as_str().to_string());
        active.date_updated = Set(now_timestamp());
        active.update(&txn).await?;

        let mut flags = Vec::with_capacity(reasons.len());
        for reason in reasons {
            let flag = fraud_flags::ActiveModel {
                loan_application_id: Set(id.value()),
                reason: Set(reason.clone()),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            flags.push(FraudFlag::from(flag));
        }

        txn.commit().await?;
        Ok(flags)
    }

    pub async fn flags_for(&self, id: LoanId) -> Result<Vec<FraudFlag>> {
        let flags = FraudFlags::find()
            .filter(fraud_flags::Column::LoanApplicationId.eq(id.value()))
            .order_by_asc(fraud_flags::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to query fraud flags")?;

        Ok(flags.into_iter().map(FraudFlag::from).collect())
    }

    /// Sets a new status. Returns `None` when the loan does not exist.
    pub async fn update_status(
        &self,
        id: LoanId,
        status: LoanStatus,
    ) -> Result<Option<LoanApplication>> {
        let Some(loan) = LoanApplications::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query loan application for update")?
        else {
            return Ok(None);
        };

        let mut active: loan_applications::ActiveModel = loan.into();
        active.status = Set(status.as_str().to_string());
        active.date_updated = Set(now_timestamp());
        let updated = active.update(&self.conn).await?;

        LoanApplication::try_from(updated).map(Some)
    }

    /// One page of the user's applications, newest first, with the total count.
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<LoanRecord>, u64)> {
        let query = LoanApplications::find()
            .filter(loan_applications::Column::UserId.eq(user_id.to_string()));
        self.fetch_page(query, limit, offset).await
    }

    /// One page of flagged applications across all users, newest first.
    pub async fn list_flagged(&self, limit: u64, offset: u64) -> Result<(Vec<LoanRecord>, u64)> {
        let query = LoanApplications::find()
            .filter(loan_applications::Column::Status.eq(LoanStatus::Flagged.as_str()));
        self.fetch_page(query, limit, offset).await
    }

    async fn fetch_page(
        &self,
        query: Select<LoanApplications>,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<LoanRecord>, u64)> {
        let total = query
            .clone()
            .count(&self.conn)
            .await
            .context("Failed to count loan applications")?;

        let loans = query
            .order_by_desc(loan_applications::Column::DateApplied)
            .order_by_desc(loan_applications::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(&self.conn)
            .await
            .context("Failed to query loan applications")?;

        let flags = loans
            .load_many(FraudFlags, &self.conn)
            .await
            .context("Failed to load fraud flags")?;

        let owner_ids: Vec<String> = loans.iter().map(|l| l.user_id.clone()).collect();
        let owners: HashMap<String, users::Model> = Users::find()
            .filter(users::Column::Id.is_in(owner_ids))
            .all(&self.conn)
            .await
            .context("Failed to load loan applicants")?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        let mut records = Vec::with_capacity(loans.len());
        for (loan, flags) in loans.into_iter().zip(flags) {
            let owner = owners
                .get(&loan.user_id)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("Loan {} has no applicant", loan.id))?;

            records.push(LoanRecord {
                loan: LoanApplication::try_from(loan)?,
                applicant: User::try_from(owner)?,
                fraud_reasons: flags.into_iter().map(|f| f.reason).collect(),
            });
        }

        Ok((records, total))
    }
}
