use axum::{
    Extension, Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::validation::{page_links, page_request, parse_loan_id, parse_user_id, read_json};
use super::{
    ApiError, AppState, DetailResponse, LoanDto, LoanRequest, PageQuery, Paginated,
    StatusUpdateRequest,
};
use crate::domain::{Action, Caller, authorize};
use crate::models::loan::LoanRecord;
use crate::services::{LoanError, LoanSubmission, Page, PageRequest};

impl From<LoanError> for ApiError {
    fn from(err: LoanError) -> Self {
        match err {
            LoanError::Validation(errors) => Self::Validation(errors),
            LoanError::Forbidden(denied) => Self::Forbidden(denied.message.to_string()),
            LoanError::UserNotFound(_) | LoanError::LoanNotFound(_) => Self::NotFound,
            LoanError::Database(msg) => Self::DatabaseError(msg),
            LoanError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

fn paginated(uri: &Uri, request: PageRequest, page: Page<LoanRecord>) -> Paginated<LoanDto> {
    let (next, previous) = page_links(uri.path(), request, page.total);
    Paginated {
        count: page.total,
        next,
        previous,
        results: page.items.into_iter().map(LoanDto::from).collect(),
    }
}

/// POST /loan/loan-request/{user_id}/
pub async fn loan_request(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(user_id): Path<String>,
    body: Result<Json<LoanRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = parse_user_id(&user_id)?;
    let payload = read_json(body)?;

    let outcome = state
        .loan_service
        .submit(
            &caller,
            user_id,
            LoanSubmission {
                amount_requested: payload.amount_requested,
                purpose: payload.purpose,
                status: payload.status,
            },
        )
        .await?;

    let response = if outcome.is_flagged() {
        DetailResponse {
            detail: "Loan submitted and flagged for review.".to_string(),
            reasons: Some(outcome.reasons),
        }
    } else {
        DetailResponse::new("Loan submitted successfully.")
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /loan/retrieve-all-loans/{user_id}/
pub async fn retrieve_all_loans(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(user_id): Path<String>,
    Query(query): Query<PageQuery>,
    uri: Uri,
) -> Result<Json<Paginated<LoanDto>>, ApiError> {
    let user_id = parse_user_id(&user_id)?;
    let request = page_request(&query, &state.config.pagination);

    let page = state
        .loan_service
        .list_for_user(&caller, user_id, request)
        .await?;

    Ok(Json(paginated(&uri, request, page)))
}

/// PUT|PATCH /loan/admin/loan/{loan_id}/
pub async fn update_loan_status(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(loan_id): Path<String>,
    body: Result<Json<StatusUpdateRequest>, JsonRejection>,
) -> Result<Json<DetailResponse>, ApiError> {
    // Non-staff get 403 even for unknown or malformed ids.
    authorize(&caller, Action::ReviewLoans).map_err(LoanError::from)?;

    let loan_id = parse_loan_id(&loan_id)?;
    let payload = read_json(body)?;

    let loan = state
        .loan_service
        .update_status(&caller, loan_id, payload.status)
        .await?;

    Ok(Json(DetailResponse::new(format!(
        "Loan #{} status successfully updated to '{}'",
        loan.id, loan.status
    ))))
}

/// GET /loan/admin/flagged-loans/
pub async fn flagged_loans(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Query(query): Query<PageQuery>,
    uri: Uri,
) -> Result<Response, ApiError> {
    let request = page_request(&query, &state.config.pagination);
    let page = state.loan_service.list_flagged(&caller, request).await?;

    if page.total == 0 {
        return Ok(Json(DetailResponse::new("No flagged loan applications at this time.")).into_response());
    }

    Ok(Json(paginated(&uri, request, page)).into_response())
}
