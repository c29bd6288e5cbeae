use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use super::{Page, PageParams};
use crate::auth::AuthUser;
use crate::company::{
    self, CompanyDetail, CompanyPayload, CompanySummary, ListFilter, StatusChange, StatusFilter, TransitionOutcome,
};
use crate::entities::CompanyStatus;
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "perPage")]
    pub per_page: Option<u64>,
    #[serde(rename = "pageNum")]
    pub page_num: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
    pub comment: Option<String>,
    pub decision_threshold: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub id: i32,
    pub deleted: bool,
}

#[tracing::instrument(skip(state, query), fields(user = %user.email))]
pub async fn list_companies(
    State(state): State<AppState>,
    user: AuthUser,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Page<CompanySummary>>, AppError> {
    let Query(query) = query?;
    let status = StatusFilter::parse(query.status.as_deref())?;
    let page = PageParams::new(query.per_page, query.page_num)?;

    let filter = ListFilter { name: query.name, status, offset: page.offset(), limit: page.per_page };
    let (results, total) = company::list_companies(&state.db, &filter).await?;
    Ok(Json(page.page(results, total)))
}

#[tracing::instrument(skip(state, payload), fields(user = %user.email))]
pub async fn create_company(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<CompanyPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<CompanyDetail>), AppError> {
    let Json(payload) = payload?;
    let detail = company::create_company(&state.db, payload, user.id).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

#[tracing::instrument(skip(state, payload), fields(user = %user.email))]
pub async fn save_draft(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<CompanyPayload>, JsonRejection>,
) -> Result<Json<CompanyDetail>, AppError> {
    let Json(payload) = payload?;
    let detail = company::save_draft(&state.db, payload, user.id).await?;
    Ok(Json(detail))
}

pub async fn get_company(
    State(state): State<AppState>,
    _user: AuthUser,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<CompanyDetail>, AppError> {
    let Path(id) = id?;
    Ok(Json(company::get_company(&state.db, id).await?))
}

pub async fn get_draft(
    State(state): State<AppState>,
    _user: AuthUser,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<CompanyDetail>, AppError> {
    let Path(id) = id?;
    Ok(Json(company::get_draft(&state.db, id).await?))
}

#[tracing::instrument(skip(state, body), fields(user = %user.email))]
pub async fn change_status(
    State(state): State<AppState>,
    user: AuthUser,
    id: Result<Path<i32>, PathRejection>,
    body: Result<Json<StatusRequest>, JsonRejection>,
) -> Result<Json<TransitionOutcome>, AppError> {
    let Path(id) = id?;
    let Json(body) = body?;
    let status = CompanyStatus::parse(&body.status)
        .ok_or_else(|| AppError::Validation(format!("unknown status {}", body.status)))?;

    let change = StatusChange { status, comment: body.comment, decision_threshold: body.decision_threshold };
    Ok(Json(company::change_status(&state.db, id, change, user.id).await?))
}

#[tracing::instrument(skip(state), fields(user = %user.email))]
pub async fn delete_company(
    State(state): State<AppState>,
    user: AuthUser,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<DeletedResponse>, AppError> {
    let Path(id) = id?;
    let id = company::delete_draft(&state.db, id).await?;
    Ok(Json(DeletedResponse { id, deleted: true }))
}
