//! Client for the external ML service.
//!
//! The service owns the request/response schema; bodies are passed through as
//! opaque JSON. Transient failures are retried with exponential backoff.

use std::time::Duration;

use backoff::future::retry_notify;
use backoff::Error as BackoffError;
use backoff::ExponentialBackoff;
use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::error::AppError;

pub const COMPETITORS: &str = "competitors";
pub const INVESTORS: &str = "investors";
pub const COMPANY_DASHBOARD: &str = "company_dashboard";
pub const NASDAQ_FEATURES: &str = "nasdaq_features";

/// What a `company_dashboard` call is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardMode {
    Search,
    Bio,
    Data,
}

impl DashboardMode {
    fn as_str(&self) -> &'static str {
        match self {
            DashboardMode::Search => "search",
            DashboardMode::Bio => "bio",
            DashboardMode::Data => "data",
        }
    }
}

#[derive(Debug, Clone)]
pub struct MlGateway {
    client: Client,
    base_url: Url,
    max_retry: Duration,
}

impl MlGateway {
    pub fn new(base_url: &str, timeout: Duration, max_retry: Duration) -> Result<Self, AppError> {
        // Url::join drops the last path segment unless the base ends with '/'
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized)
            .map_err(|e| AppError::InternalError(format!("invalid ML_API url {}: {}", base_url, e)))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::InternalError(format!("failed to build HTTP client: {}", e)))?;

        Ok(MlGateway { client, base_url, max_retry })
    }

    pub fn endpoint(&self, suffix: &str) -> Result<Url, AppError> {
        self.base_url
            .join(suffix)
            .map_err(|e| AppError::InternalError(format!("invalid ML endpoint {}: {}", suffix, e)))
    }

    pub async fn competitors(&self, query: &[(String, String)]) -> Result<Value, AppError> {
        self.get(COMPETITORS, query).await
    }

    pub async fn investors(&self, query: &[(String, String)]) -> Result<Value, AppError> {
        self.get(INVESTORS, query).await
    }

    pub async fn company_dashboard(&self, mode: DashboardMode, query: &[(String, String)]) -> Result<Value, AppError> {
        let mut params = Vec::with_capacity(query.len() + 1);
        params.push(("mode".to_string(), mode.as_str().to_string()));
        params.extend(query.iter().filter(|(key, _)| key != "mode").cloned());
        self.get(COMPANY_DASHBOARD, &params).await
    }

    pub async fn analytics(&self, query: &[(String, String)]) -> Result<Value, AppError> {
        self.get(NASDAQ_FEATURES, query).await
    }

    /// GET `suffix` with `query`, retrying transient failures.
    #[tracing::instrument(skip(self, query), fields(suffix = %suffix))]
    pub async fn get(&self, suffix: &str, query: &[(String, String)]) -> Result<Value, AppError> {
        let url = self.endpoint(suffix)?;
        let backoff = ExponentialBackoff {
            initial_interval: Duration::from_millis(100),
            max_elapsed_time: Some(self.max_retry),
            ..ExponentialBackoff::default()
        };

        let response = retry_notify(
            backoff,
            || async {
                match self.client.get(url.clone()).query(query).send().await {
                    Ok(resp) => {
                        let status = resp.status();
                        if status.is_success() {
                            Ok(resp)
                        } else if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                            tracing::debug!("Retrying on status: {}", status);
                            Err(BackoffError::transient(anyhow::anyhow!(
                                "ML service returned retryable status: {}",
                                status
                            )))
                        } else {
                            Err(BackoffError::permanent(anyhow::anyhow!(
                                "ML service returned status: {}",
                                status
                            )))
                        }
                    }
                    Err(err) => {
                        if err.is_timeout() || err.is_connect() || err.is_request() {
                            tracing::debug!("Retrying on reqwest error: {}", err);
                            Err(BackoffError::transient(anyhow::Error::new(err)))
                        } else {
                            Err(BackoffError::permanent(anyhow::Error::new(err)))
                        }
                    }
                }
            },
            retry_notify_handler,
        )
        .await
        .map_err(|e| {
            tracing::error!("ML request to {} failed: {}", url, e);
            AppError::Upstream(e.to_string())
        })?;

        response
            .json::<Value>()
            .await
            .map_err(|e| AppError::Upstream(format!("invalid JSON from ML service: {}", e)))
    }
}

fn retry_notify_handler<E>(err: E, duration: Duration)
where
    E: std::fmt::Display,
{
    tracing::warn!(
        "ML request failed: {}. Retrying in {:.1}s...",
        err,
        duration.as_secs_f32()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_keeps_base_path() {
        let gateway = MlGateway::new("http://ml.internal/api/v1", Duration::from_secs(1), Duration::from_secs(1)).unwrap();
        assert_eq!(gateway.endpoint(COMPETITORS).unwrap().as_str(), "http://ml.internal/api/v1/competitors");

        let gateway = MlGateway::new("http://ml.internal/api/", Duration::from_secs(1), Duration::from_secs(1)).unwrap();
        assert_eq!(gateway.endpoint(NASDAQ_FEATURES).unwrap().as_str(), "http://ml.internal/api/nasdaq_features");
    }

    #[test]
    fn rejects_invalid_base_url() {
        let err = MlGateway::new("not a url", Duration::from_secs(1), Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, AppError::InternalError(_)));
    }
}
