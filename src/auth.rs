//! Bearer-token identity.
//!
//! Token issuance and authorization policy live in the identity service; here
//! the token is only validated and its subject (an email) resolved to a user
//! row, whose id becomes the owner of anything the request creates.

use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};

use crate::entities::{user, User};
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User email
    pub sub: String,
    pub exp: i64,
}

/// The user behind the request's bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i32,
    pub email: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing Authorization header".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("expected a Bearer token".to_string()))?;

        let email = verify_token(&state.config.jwt_secret, token)?;

        let user = User::find()
            .filter(user::Column::Email.eq(email.as_str()))
            .one(&state.db)
            .await?
            .ok_or_else(|| AppError::Unauthorized(format!("unknown user {}", email)))?;

        Ok(AuthUser { id: user.id, email: user.email })
    }
}

/// Validates signature and expiry and returns the token subject.
pub fn verify_token(secret: &str, token: &str) -> Result<String, AppError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| AppError::Unauthorized(format!("invalid token: {}", e)))?;
    Ok(data.claims.sub)
}

/// Signs a token for `email`, valid for `ttl_secs` seconds.
pub fn issue_token(secret: &str, email: &str, ttl_secs: i64) -> Result<String, AppError> {
    let claims = Claims {
        sub: email.to_string(),
        exp: Utc::now().timestamp() + ttl_secs,
    };
    encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| AppError::InternalError(format!("failed to sign token: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_round_trips_subject() {
        let token = issue_token("secret", "analyst@example.com", 60).unwrap();
        assert_eq!(verify_token("secret", &token).unwrap(), "analyst@example.com");
    }

    #[test]
    fn wrong_secret_and_expired_tokens_are_rejected() {
        let token = issue_token("secret", "analyst@example.com", 60).unwrap();
        assert!(matches!(verify_token("other", &token), Err(AppError::Unauthorized(_))));

        // Default validation leeway is 60 seconds
        let expired = issue_token("secret", "analyst@example.com", -600).unwrap();
        assert!(matches!(verify_token("secret", &expired), Err(AppError::Unauthorized(_))));
    }
}
