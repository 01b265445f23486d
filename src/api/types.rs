use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::loan::LoanRecord;

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DetailResponse {
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasons: Option<Vec<String>>,
}

impl DetailResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
            reasons: None,
        }
    }
}

/// Limit/offset page in the usual REST framework layout.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// Raw pagination parameters. Kept as strings so bad values can fall back to defaults.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserInfoDto {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
}

#[derive(Debug, Serialize)]
pub struct LoanDto {
    pub id: i32,
    pub user: UserInfoDto,
    pub amount_requested: String,
    pub purpose: String,
    pub status: String,
    pub date_applied: String,
    pub fraud_reasons: Vec<String>,
}

impl From<LoanRecord> for LoanDto {
    fn from(record: LoanRecord) -> Self {
        Self {
            id: record.loan.id.value(),
            user: UserInfoDto {
                id: record.applicant.id,
                full_name: record.applicant.full_name(),
                email: record.applicant.email,
            },
            amount_requested: record.loan.amount_requested.to_string(),
            purpose: record.loan.purpose,
            status: record.loan.status.to_string(),
            date_applied: record.loan.date_applied,
            fraud_reasons: record.fraud_reasons,
        }
    }
}

/// Body of `POST /account/registration/`.
#[derive(Debug, Default, Deserialize)]
pub struct RegistrationRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
    pub password2: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Body of the refresh and logout endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    pub refresh: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoanRequest {
    pub amount_requested: Option<serde_json::Value>,
    pub purpose: Option<serde_json::Value>,
    pub status: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: Option<serde_json::Value>,
}
