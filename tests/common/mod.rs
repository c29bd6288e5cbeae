#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, Method, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use dealflow::{
    auth::issue_token,
    config::Config,
    create_app, db,
    entities::{ceo_education, company, dashboard, deal_type, industry, user, CompanyStatus},
    gateway::MlGateway,
    AppState,
};
use http_body_util::BodyExt;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

pub const JWT_SECRET: &str = "test-secret";
pub const USER_EMAIL: &str = "analyst@example.com";

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

pub struct TestApp {
    pub app: Router,
    pub db: DatabaseConnection,
    pub token: String,
    pub user_id: i32,
}

impl TestApp {
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token));
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        send(&self.app, builder.body(body).unwrap()).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, None).await
    }
}

/// Runs one request through the router; non-JSON bodies come back as a string value.
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, body)
}

pub fn test_config(ml_api: &str) -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        ml_api: ml_api.to_string(),
        jwt_secret: JWT_SECRET.to_string(),
        ml_timeout: Duration::from_secs(2),
        ml_max_retry: Duration::from_secs(1),
        rate_limit_burst: None,
    }
}

/// Fresh in-memory database, seeded lookups and one user, ML calls going to an echo stub.
pub async fn spawn_app() -> TestApp {
    let ml_api = spawn_echo_ml().await;
    spawn_app_with_ml(&ml_api).await
}

pub async fn spawn_app_with_ml(ml_api: &str) -> TestApp {
    spawn_app_with_config(test_config(ml_api)).await
}

pub async fn spawn_app_with_config(config: Config) -> TestApp {
    init_tracing();
    let db = db::connect(&config.database_url).await.unwrap();
    let user_id = seed(&db).await;
    let token = issue_token(JWT_SECRET, USER_EMAIL, 3600).unwrap();

    let gateway = MlGateway::new(&config.ml_api, config.ml_timeout, config.ml_max_retry).unwrap();
    let app = create_app(AppState { db: db.clone(), gateway, config: Arc::new(config) });
    TestApp { app, db, token, user_id }
}

async fn seed(db: &DatabaseConnection) -> i32 {
    for name in ["Fintech", "Health", "Robotics"] {
        industry::ActiveModel { name: Set(name.to_string()), ..Default::default() }
            .insert(db)
            .await
            .unwrap();
    }
    for name in ["Seed", "Series A"] {
        deal_type::ActiveModel { name: Set(name.to_string()), ..Default::default() }
            .insert(db)
            .await
            .unwrap();
    }
    ceo_education::ActiveModel { name: Set("MBA".to_string()), ..Default::default() }
        .insert(db)
        .await
        .unwrap();

    user::ActiveModel {
        email: Set(USER_EMAIL.to_string()),
        name: Set(Some("Analyst".to_string())),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
    .id
}

/// Inserts a bare company row, bypassing the API.
pub async fn insert_company(db: &DatabaseConnection, name: &str, status: CompanyStatus, is_active: bool) -> i32 {
    insert_company_with_uuid(db, name, status, is_active, None).await
}

pub async fn insert_company_with_uuid(
    db: &DatabaseConnection,
    name: &str,
    status: CompanyStatus,
    is_active: bool,
    uuid: Option<Uuid>,
) -> i32 {
    let now = Utc::now();
    company::ActiveModel {
        uuid: Set(uuid),
        name: Set(name.to_string()),
        status: Set(status),
        number_competitors: Set(0),
        is_active: Set(is_active),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
    .id
}

pub async fn insert_report(
    db: &DatabaseConnection,
    company_id: i32,
    total_score: f64,
    features: Value,
    created_at: DateTime<Utc>,
) -> i32 {
    dashboard::ActiveModel {
        company_id: Set(company_id),
        total_score: Set(Some(total_score)),
        decision_threshold: Set(Some(0.5)),
        features: Set(Some(features)),
        created_at: Set(created_at),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
    .id
}

/// A company with two industries, two competitors and two rounds of investor links.
pub fn full_payload(name: &str) -> Value {
    json!({
        "name": name,
        "bio": "Warehouse robots",
        "year_founded": 2019,
        "first_financing_deal_type": 1,
        "industries": [1, 3],
        "competitors": ["Botco", "Movers"],
        "rounds": [
            {
                "name": "Seed",
                "deal_type_id": 1,
                "amount": 1.5,
                "sub_rounds": [
                    {"name": "Seed I", "investors": [
                        {"name": "Alpha Capital", "lead": true},
                        {"name": "Beta Ventures", "new": true, "corporate": true}
                    ]}
                ]
            },
            {
                "name": "Series A",
                "deal_type_id": 2,
                "amount": 12.0,
                "sub_rounds": [
                    {"name": "A1", "investors": [{"name": "Gamma Partners", "corporate": true}]},
                    {"name": "A2", "investors": [{"name": "Alpha Capital", "new": true}]}
                ]
            }
        ]
    })
}

/// Echoes the path and forwarded query of every request.
pub async fn spawn_echo_ml() -> String {
    async fn echo(uri: Uri, Query(params): Query<Vec<(String, String)>>) -> Json<Value> {
        Json(json!({ "path": uri.path(), "params": params }))
    }

    serve_stub(Router::new().fallback(echo)).await
}

/// Answers `status` for the first `failures` requests, then 200. Returns the hit counter.
pub async fn spawn_flaky_ml(failures: usize, status: StatusCode) -> (String, Arc<AtomicUsize>) {
    async fn flaky(State((hits, failures, status)): State<(Arc<AtomicUsize>, usize, StatusCode)>) -> Response {
        let attempt = hits.fetch_add(1, Ordering::SeqCst);
        if attempt < failures {
            (status, Json(json!({ "error": "unavailable" }))).into_response()
        } else {
            Json(json!({ "ok": true, "attempt": attempt + 1 })).into_response()
        }
    }

    let hits = Arc::new(AtomicUsize::new(0));
    let stub = Router::new()
        .route("/{*path}", get(flaky))
        .with_state((hits.clone(), failures, status));
    (serve_stub(stub).await, hits)
}

async fn serve_stub(stub: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, stub).await.unwrap();
    });
    format!("http://{}", addr)
}
