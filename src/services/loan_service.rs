//! Domain service for loan applications.
//!
//! Submission runs validation, persistence, fraud screening and flagging in
//! that order. Review operations are restricted to staff.

use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{AccessDenied, Caller, FieldErrors, LoanId};
use crate::models::loan::{LoanApplication, LoanRecord};

#[derive(Debug, Error)]
pub enum LoanError {
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("{0}")]
    Forbidden(#[from] AccessDenied),

    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    #[error("Loan application not found: {0}")]
    LoanNotFound(LoanId),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for LoanError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for LoanError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

impl From<FieldErrors> for LoanError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

/// Raw submission payload, validated by the service.
#[derive(Debug, Clone, Default)]
pub struct LoanSubmission {
    pub amount_requested: Option<Value>,
    pub purpose: Option<Value>,
    /// Validated when present, then ignored: new loans always start pending.
    pub status: Option<Value>,
}

/// A stored application and the reasons it was flagged, if any.
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub loan: LoanApplication,
    pub reasons: Vec<String>,
}

impl SubmissionOutcome {
    #[must_use]
    pub fn is_flagged(&self) -> bool {
        !self.reasons.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u64,
    pub offset: u64,
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

#[async_trait::async_trait]
pub trait LoanService: Send + Sync {
    /// Submits a loan for `user_id` on behalf of `caller`.
    ///
    /// # Errors
    ///
    /// - [`LoanError::UserNotFound`] if the target user does not exist
    /// - [`LoanError::Forbidden`] if the caller is not the target user
    /// - [`LoanError::Validation`] if the payload is rejected
    async fn submit(
        &self,
        caller: &Caller,
        user_id: Uuid,
        submission: LoanSubmission,
    ) -> Result<SubmissionOutcome, LoanError>;

    /// The user's own applications, newest first.
    async fn list_for_user(
        &self,
        caller: &Caller,
        user_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<LoanRecord>, LoanError>;

    /// Flagged applications across all users. Staff only.
    async fn list_flagged(
        &self,
        caller: &Caller,
        page: PageRequest,
    ) -> Result<Page<LoanRecord>, LoanError>;

    /// Applies a status change. A missing `status` leaves the loan unchanged.
    async fn update_status(
        &self,
        caller: &Caller,
        loan_id: LoanId,
        status: Option<Value>,
    ) -> Result<LoanApplication, LoanError>;
}
