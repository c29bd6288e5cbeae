use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use sea_orm::DatabaseConnection;
use tower_governor::{governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer};
use tower_http::cors::{Any, CorsLayer};

pub mod auth;
pub mod company;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod gateway;
pub mod reports;
pub mod routes;

use config::Config;
use gateway::MlGateway;
use routes::{companies, external, reference, reports as report_routes};

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub gateway: MlGateway,
    pub config: Arc<Config>,
}

pub fn create_app(state: AppState) -> Router {
    let rate_limit_burst = state.config.rate_limit_burst;

    let api_routes = Router::new()
        .route(
            "/companies",
            get(companies::list_companies).post(companies::create_company),
        )
        .route("/companies/draft", post(companies::save_draft))
        .route("/companies/draft/{id}", get(companies::get_draft))
        .route("/companies/search", get(external::search))
        .route("/companies/get/bio", get(external::bio))
        .route("/companies/fetch/data", get(external::fetch_data))
        .route("/companies/analytics", get(external::analytics))
        .route("/companies/history", get(report_routes::history))
        .route("/companies/inference/{id}", get(report_routes::inference_report))
        .route("/companies/difference", get(report_routes::difference))
        .route(
            "/companies/{id}",
            get(companies::get_company)
                .patch(companies::change_status)
                .delete(companies::delete_company),
        )
        .route("/investors", get(external::investors))
        .route("/competitors", get(external::competitors))
        .route("/industries", get(reference::industries))
        .route("/finance-dealtype", get(reference::deal_types))
        .route("/ceo-education", get(reference::ceo_educations))
        .with_state(state);

    // Rate limiting only when RATE_LIMIT_BURST is set
    let api_routes = match rate_limit_burst {
        Some(burst) => match GovernorConfigBuilder::default()
            .key_extractor(SmartIpKeyExtractor)
            .period(Duration::from_secs(60))
            .burst_size(burst)
            .finish()
        {
            Some(conf) => api_routes.layer(GovernorLayer { config: Arc::new(conf) }),
            None => {
                tracing::warn!("Invalid rate limit burst {}, rate limiting disabled", burst);
                api_routes
            }
        },
        None => api_routes,
    };

    Router::new()
        .route("/health", get(routes::health_check))
        .merge(api_routes)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
