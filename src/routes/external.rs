//! Pass-through endpoints backed by the ML service. Query strings are
//! forwarded as-is and the upstream JSON is returned unchanged.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde_json::Value;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::gateway::DashboardMode;
use crate::AppState;

type Forwarded = Result<Query<Vec<(String, String)>>, QueryRejection>;

pub async fn competitors(State(state): State<AppState>, _user: AuthUser, query: Forwarded) -> Result<Json<Value>, AppError> {
    let Query(query) = query?;
    Ok(Json(state.gateway.competitors(&query).await?))
}

pub async fn investors(State(state): State<AppState>, _user: AuthUser, query: Forwarded) -> Result<Json<Value>, AppError> {
    let Query(query) = query?;
    Ok(Json(state.gateway.investors(&query).await?))
}

pub async fn search(State(state): State<AppState>, _user: AuthUser, query: Forwarded) -> Result<Json<Value>, AppError> {
    let Query(query) = query?;
    Ok(Json(state.gateway.company_dashboard(DashboardMode::Search, &query).await?))
}

pub async fn bio(State(state): State<AppState>, _user: AuthUser, query: Forwarded) -> Result<Json<Value>, AppError> {
    let Query(query) = query?;
    Ok(Json(state.gateway.company_dashboard(DashboardMode::Bio, &query).await?))
}

pub async fn fetch_data(State(state): State<AppState>, _user: AuthUser, query: Forwarded) -> Result<Json<Value>, AppError> {
    let Query(query) = query?;
    Ok(Json(state.gateway.company_dashboard(DashboardMode::Data, &query).await?))
}

pub async fn analytics(State(state): State<AppState>, _user: AuthUser, query: Forwarded) -> Result<Json<Value>, AppError> {
    let Query(query) = query?;
    Ok(Json(state.gateway.analytics(&query).await?))
}
