//! `SeaORM` implementation of the `LoanService` trait.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::Store;
use crate::domain::validation::{text_value, validate_amount, validate_purpose, validate_status};
use crate::domain::{Action, Caller, FieldErrors, LoanId, authorize};
use crate::models::loan::{LoanApplication, LoanRecord};
use crate::models::user::User;
use crate::services::fraud::{FraudRuleEvaluator, flag_loan};
use crate::services::loan_service::{
    LoanError, LoanService, LoanSubmission, Page, PageRequest, SubmissionOutcome,
};
use crate::services::notification::FlaggedLoanNotifier;

pub struct SeaOrmLoanService {
    store: Store,
    evaluator: FraudRuleEvaluator,
    notifier: FlaggedLoanNotifier,
}

impl SeaOrmLoanService {
    #[must_use]
    pub const fn new(
        store: Store,
        evaluator: FraudRuleEvaluator,
        notifier: FlaggedLoanNotifier,
    ) -> Self {
        Self {
            store,
            evaluator,
            notifier,
        }
    }

    async fn target_user(&self, user_id: Uuid) -> Result<User, LoanError> {
        self.store
            .get_user(user_id)
            .await?
            .ok_or(LoanError::UserNotFound(user_id))
    }
}

/// Cleaned submission fields.
struct ValidSubmission {
    amount: rust_decimal::Decimal,
    purpose: String,
}

fn validate_submission(submission: &LoanSubmission) -> Result<ValidSubmission, FieldErrors> {
    let mut errors = FieldErrors::new();

    let amount = errors.check(
        "amount_requested",
        validate_amount(submission.amount_requested.as_ref()),
    );

    let purpose = errors
        .check("purpose", text_value(submission.purpose.as_ref()))
        .and_then(|text| errors.check("purpose", validate_purpose(text.as_deref())));

    if let Some(Some(status)) = errors.check("status", text_value(submission.status.as_ref())) {
        errors.check("status", validate_status(&status));
    }

    errors.into_result()?;

    match (amount, purpose) {
        (Some(amount), Some(purpose)) => Ok(ValidSubmission { amount, purpose }),
        _ => Err(FieldErrors::single(
            crate::domain::validation::NON_FIELD_ERRORS,
            "Invalid loan submission.",
        )),
    }
}

#[async_trait]
impl LoanService for SeaOrmLoanService {
    async fn submit(
        &self,
        caller: &Caller,
        user_id: Uuid,
        submission: LoanSubmission,
    ) -> Result<SubmissionOutcome, LoanError> {
        let applicant = self.target_user(user_id).await?;

        if let Err(denied) = authorize(caller, Action::ApplyForLoan(applicant.id)) {
            warn!(
                caller_id = %caller.id,
                user_id = %user_id,
                "Loan submission on behalf of another user refused"
            );
            return Err(denied.into());
        }

        let valid = validate_submission(&submission).map_err(|errors| {
            warn!(user_id = %user_id, errors = %errors, "Loan submission rejected");
            errors
        })?;

        let loan = self
            .store
            .create_loan(applicant.id, valid.amount, &valid.purpose)
            .await?;
        metrics::counter!("loans_submitted_total").increment(1);

        let found = self
            .evaluator
            .evaluate(&self.store, &applicant, loan.amount_requested)
            .await;

        if found.is_empty() {
            info!(loan_id = %loan.id, user_id = %user_id, "Loan submitted");
            return Ok(SubmissionOutcome {
                loan,
                reasons: Vec::new(),
            });
        }

        for reason in &found {
            metrics::counter!("loans_flagged_total", "rule" => reason.rule.as_str()).increment(1);
        }
        let reasons: Vec<String> = found.into_iter().map(|r| r.message).collect();

        flag_loan(&self.store, &loan, &reasons).await?;
        let loan = self
            .store
            .get_loan(loan.id)
            .await?
            .ok_or(LoanError::LoanNotFound(loan.id))?;

        warn!(
            loan_id = %loan.id,
            user_id = %user_id,
            reasons = ?reasons,
            "Loan submitted and flagged"
        );

        self.notifier
            .notify(loan.clone(), applicant, reasons.clone());

        Ok(SubmissionOutcome { loan, reasons })
    }

    async fn list_for_user(
        &self,
        caller: &Caller,
        user_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<LoanRecord>, LoanError> {
        let owner = self.target_user(user_id).await?;

        if let Err(denied) = authorize(caller, Action::ViewLoans(owner.id)) {
            warn!(
                caller_id = %caller.id,
                user_id = %user_id,
                "Loan history access for another user refused"
            );
            return Err(denied.into());
        }

        let (items, total) = self
            .store
            .list_user_loans(owner.id, page.limit, page.offset)
            .await?;

        info!(user_id = %user_id, total, "Loan history retrieved");
        Ok(Page { items, total })
    }

    async fn list_flagged(
        &self,
        caller: &Caller,
        page: PageRequest,
    ) -> Result<Page<LoanRecord>, LoanError> {
        authorize(caller, Action::ReviewLoans)?;

        let (items, total) = self
            .store
            .list_flagged_loans(page.limit, page.offset)
            .await?;

        info!(caller_id = %caller.id, total, returned = items.len(), "Flagged loans retrieved");
        Ok(Page { items, total })
    }

    async fn update_status(
        &self,
        caller: &Caller,
        loan_id: LoanId,
        status: Option<Value>,
    ) -> Result<LoanApplication, LoanError> {
        authorize(caller, Action::ReviewLoans)?;

        let loan = self
            .store
            .get_loan(loan_id)
            .await?
            .ok_or(LoanError::LoanNotFound(loan_id))?;

        let requested = text_value(status.as_ref())
            .and_then(|text| text.map(|s| validate_status(&s)).transpose())
            .map_err(|msg| FieldErrors::single("status", msg))?;

        let Some(new_status) = requested else {
            return Ok(loan);
        };

        let updated = self
            .store
            .update_loan_status(loan_id, new_status)
            .await?
            .ok_or(LoanError::LoanNotFound(loan_id))?;

        info!(
            caller_id = %caller.id,
            loan_id = %loan_id,
            from = %loan.status,
            to = %updated.status,
            "Loan status updated"
        );
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validation_collects_every_field() {
        let errors = validate_submission(&LoanSubmission {
            amount_requested: Some(json!("-5")),
            purpose: Some(json!("12345")),
            status: Some(json!("cancelled")),
        })
        .err()
        .unwrap();

        assert_eq!(
            errors.get("amount_requested").unwrap(),
            ["The amount requested cannot be a negative value."]
        );
        assert_eq!(
            errors.get("purpose").unwrap(),
            ["Purpose cannot be purely numeric."]
        );
        assert_eq!(errors.get("status").unwrap(), ["Invalid status choice"]);
    }

    #[test]
    fn test_missing_fields_are_required() {
        let errors = validate_submission(&LoanSubmission::default()).err().unwrap();
        assert!(errors.contains("amount_requested"));
        assert!(errors.contains("purpose"));
        assert!(!errors.contains("status"));
    }

    #[test]
    fn test_valid_submission_ignores_known_status() {
        let valid = validate_submission(&LoanSubmission {
            amount_requested: Some(json!(50000)),
            purpose: Some(json!("  Business expansion ")),
            status: Some(json!("approved")),
        })
        .unwrap();

        assert_eq!(valid.amount, rust_decimal::Decimal::new(5_000_000, 2));
        assert_eq!(valid.purpose, "Business expansion");
    }
}
