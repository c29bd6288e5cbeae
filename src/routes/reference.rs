use axum::{extract::State, Json};

use crate::auth::AuthUser;
use crate::company::{reference_list, NamedRef};
use crate::entities::{CeoEducation, DealType, Industry};
use crate::error::AppError;
use crate::AppState;

pub async fn industries(State(state): State<AppState>, _user: AuthUser) -> Result<Json<Vec<NamedRef>>, AppError> {
    Ok(Json(reference_list::<Industry>(&state.db).await?))
}

pub async fn deal_types(State(state): State<AppState>, _user: AuthUser) -> Result<Json<Vec<NamedRef>>, AppError> {
    Ok(Json(reference_list::<DealType>(&state.db).await?))
}

pub async fn ceo_educations(State(state): State<AppState>, _user: AuthUser) -> Result<Json<Vec<NamedRef>>, AppError> {
    Ok(Json(reference_list::<CeoEducation>(&state.db).await?))
}
