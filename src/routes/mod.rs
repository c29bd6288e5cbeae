// HTTP handlers, grouped by resource
pub mod companies;
pub mod external;
pub mod reference;
pub mod reports;

use axum::{http::StatusCode, response::IntoResponse};
use serde::Serialize;

use crate::error::AppError;

pub const DEFAULT_PER_PAGE: u64 = 10;
pub const DEFAULT_PAGE_NUM: u64 = 1;
pub const MAX_PER_PAGE: u64 = 100;

/// List response envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub results: Vec<T>,
    pub total: u64,
    pub per_page: u64,
    pub page_num: u64,
}

/// Resolved `perPage`/`pageNum`, both 1-based and at least 1. The offset they
/// produce always fits the signed 64-bit range the database binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub per_page: u64,
    pub page_num: u64,
}

impl PageParams {
    pub fn new(per_page: Option<u64>, page_num: Option<u64>) -> Result<Self, AppError> {
        let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE);
        let page_num = page_num.unwrap_or(DEFAULT_PAGE_NUM);
        if per_page < 1 {
            return Err(AppError::Validation("perPage must be at least 1".to_string()));
        }
        if page_num < 1 {
            return Err(AppError::Validation("pageNum must be at least 1".to_string()));
        }
        if per_page > MAX_PER_PAGE {
            return Err(AppError::Validation(format!("perPage must be at most {}", MAX_PER_PAGE)));
        }
        match (page_num - 1).checked_mul(per_page) {
            Some(offset) if offset <= i64::MAX as u64 => Ok(PageParams { per_page, page_num }),
            _ => Err(AppError::Validation("pageNum is too large".to_string())),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page_num - 1).saturating_mul(self.per_page)
    }

    pub fn page<T>(&self, results: Vec<T>, total: u64) -> Page<T> {
        Page { results, total, per_page: self.per_page, page_num: self.page_num }
    }
}

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "Service is healthy")
}
