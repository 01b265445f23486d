use axum::{Json, extract::rejection::JsonRejection};
use uuid::Uuid;

use super::{ApiError, PageQuery};
use crate::config::PaginationConfig;
use crate::domain::LoanId;
use crate::services::PageRequest;

/// Path segments that do not parse are treated as unknown resources.
pub fn parse_user_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound)
}

pub fn parse_loan_id(raw: &str) -> Result<LoanId, ApiError> {
    raw.parse::<i32>()
        .ok()
        .filter(|id| *id >= 0)
        .map(LoanId::new)
        .ok_or(ApiError::NotFound)
}

/// An empty or content-type-less body reads as an empty object.
pub fn read_json<T: Default>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(T::default()),
        Err(JsonRejection::JsonSyntaxError(e)) => {
            Err(ApiError::BadRequest(format!("JSON parse error - {}", e.body_text())))
        }
        Err(e) => Err(ApiError::BadRequest(e.body_text())),
    }
}

/// The database binds limit/offset as signed 64-bit integers.
const MAX_PAGE_VALUE: u64 = i64::MAX.unsigned_abs();

/// Clamps limit/offset. Unparseable values fall back to the defaults.
#[must_use]
pub fn page_request(query: &PageQuery, config: &PaginationConfig) -> PageRequest {
    let limit = query
        .limit
        .as_deref()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|limit| *limit > 0)
        .map_or(config.default_limit, |limit| limit.min(config.max_limit))
        .min(MAX_PAGE_VALUE);

    let offset = query
        .offset
        .as_deref()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(0)
        .min(MAX_PAGE_VALUE);

    PageRequest { limit, offset }
}

/// `(next, previous)` links for a page of `total` items.
#[must_use]
pub fn page_links(path: &str, page: PageRequest, total: u64) -> (Option<String>, Option<String>) {
    let next_offset = page.offset.saturating_add(page.limit);
    let next = (next_offset < total)
        .then(|| format!("{path}?limit={}&offset={next_offset}", page.limit));

    let previous = if page.offset == 0 {
        None
    } else if page.offset <= page.limit {
        Some(format!("{path}?limit={}", page.limit))
    } else {
        Some(format!(
            "{path}?limit={}&offset={}",
            page.limit,
            page.offset - page.limit
        ))
    };

    (next, previous)
}
