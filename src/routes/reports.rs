use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use serde::Deserialize;

use super::{Page, PageParams};
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::reports::{self, ReportDetail, ReportDifference, ReportSummary};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub name: Option<String>,
    #[serde(rename = "perPage")]
    pub per_page: Option<u64>,
    #[serde(rename = "pageNum")]
    pub page_num: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct DifferenceQuery {
    pub id: Option<i32>,
}

pub async fn history(
    State(state): State<AppState>,
    _user: AuthUser,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<Page<ReportSummary>>, AppError> {
    let Query(query) = query?;
    let page = PageParams::new(query.per_page, query.page_num)?;
    let (results, total) = reports::history(&state.db, query.name.as_deref(), page.offset(), page.per_page).await?;
    Ok(Json(page.page(results, total)))
}

pub async fn inference_report(
    State(state): State<AppState>,
    _user: AuthUser,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<ReportDetail>, AppError> {
    let Path(id) = id?;
    Ok(Json(reports::report(&state.db, id).await?))
}

pub async fn difference(
    State(state): State<AppState>,
    _user: AuthUser,
    query: Result<Query<DifferenceQuery>, QueryRejection>,
) -> Result<Json<ReportDifference>, AppError> {
    let Query(query) = query?;
    let id = query.id.ok_or_else(|| AppError::Validation("id is required".to_string()))?;
    Ok(Json(reports::difference(&state.db, id).await?))
}
