use anyhow::Context;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::LoanId;
use crate::entities::{fraud_flags, loan_applications};

use super::user::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Flagged,
}

impl LoanStatus {
    pub const ALL: [Self; 4] = [Self::Pending, Self::Approved, Self::Rejected, Self::Flagged];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Flagged => "flagged",
        }
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown loan status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for LoanStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanApplication {
    pub id: LoanId,
    pub user_id: Uuid,
    pub amount_requested: Decimal,
    pub purpose: String,
    pub status: LoanStatus,
    pub date_applied: String,
    pub date_updated: String,
}

impl TryFrom<loan_applications::Model> for LoanApplication {
    type Error = anyhow::Error;

    fn try_from(model: loan_applications::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: LoanId::new(model.id),
            user_id: Uuid::parse_str(&model.user_id)
                .with_context(|| format!("Loan {} has a malformed user id", model.id))?,
            amount_requested: Decimal::from_str(&model.amount_requested)
                .with_context(|| format!("Loan {} has a malformed amount", model.id))?,
            purpose: model.purpose,
            status: model.status.parse()?,
            date_applied: model.date_applied,
            date_updated: model.date_updated,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FraudFlag {
    pub id: i32,
    pub loan_application_id: LoanId,
    pub reason: String,
}

impl From<fraud_flags::Model> for FraudFlag {
    fn from(model: fraud_flags::Model) -> Self {
        Self {
            id: model.id,
            loan_application_id: LoanId::new(model.loan_application_id),
            reason: model.reason,
        }
    }
}

/// A loan joined with its applicant and the reasons it was flagged, if any.
#[derive(Debug, Clone)]
pub struct LoanRecord {
    pub loan: LoanApplication,
    pub applicant: User,
    pub fraud_reasons: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in LoanStatus::ALL {
            assert_eq!(status.as_str().parse::<LoanStatus>(), Ok(status));
        }
        assert!("cancelled".parse::<LoanStatus>().is_err());
        assert!("Pending".parse::<LoanStatus>().is_err());
    }

    #[test]
    fn test_model_conversion() {
        let user_id = Uuid::new_v4();
        let model = loan_applications::Model {
            id: 7,
            user_id: user_id.to_string(),
            amount_requested: "50000.00".to_string(),
            purpose: "Business expansion".to_string(),
            status: "flagged".to_string(),
            date_applied: "2025-06-01T10:00:00.000000Z".to_string(),
            date_updated: "2025-06-01T10:00:00.000000Z".to_string(),
        };

        let loan = LoanApplication::try_from(model).unwrap();
        assert_eq!(loan.id.value(), 7);
        assert_eq!(loan.user_id, user_id);
        assert_eq!(loan.amount_requested, Decimal::new(5_000_000, 2));
        assert_eq!(loan.status, LoanStatus::Flagged);
    }
}
