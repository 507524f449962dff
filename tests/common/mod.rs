#![allow(dead_code)]

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
    routing::get,
    Router,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use charger_status_api::{
    api::{create_router, AppState},
    config::{CorsConfig, UpstreamConfig},
    db::{self, DbPool},
    repositories::MappingsRepository,
    services::StatusService,
    upstream::StatusClient,
};

pub const STATUS_PAGE: &str = r#"<!DOCTYPE html>
<html>
  <head><title>Status: page title</title></head>
  <body>
    <div>Power: 7kW</div>
    <div>Status: Idle</div>
    <div>NotAField</div>
    <div>UpdatedAt: 2024-05-01 12:30:45</div>
    <div>Power: 11kW</div>
  </body>
</html>"#;

/// Serial numbers the fake status page knows how to answer.
pub const SERIAL_OK: &str = "SN-OK";
pub const SERIAL_BROKEN: &str = "SN-500";
pub const SERIAL_SLOW: &str = "SN-SLOW";

/// Single-connection in-memory database with the schema applied.
pub async fn create_test_pool() -> DbPool {
    let pool = db::connect("sqlite::memory:", 1).await.unwrap();
    db::init_schema(&pool).await.unwrap();
    pool
}

/// A stand-in for the vendor status page, listening on a random local port.
pub struct FakeUpstream {
    pub base_url: String,
    hits: Arc<AtomicUsize>,
}

impl FakeUpstream {
    pub async fn start() -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route("/status/{serial}", get(status_page))
            .with_state(hits.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}/status/", addr),
            hits,
        }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> UpstreamConfig {
        UpstreamConfig {
            base_url: self.base_url.clone(),
            timeout_secs: 1,
            concurrency: 4,
        }
    }
}

async fn status_page(
    State(hits): State<Arc<AtomicUsize>>,
    Path(serial): Path<String>,
) -> (StatusCode, Html<String>) {
    hits.fetch_add(1, Ordering::SeqCst);

    match serial.as_str() {
        SERIAL_OK => (StatusCode::OK, Html(STATUS_PAGE.to_string())),
        SERIAL_BROKEN => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html("<body>boom</body>".to_string()),
        ),
        SERIAL_SLOW => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            (StatusCode::OK, Html(STATUS_PAGE.to_string()))
        }
        _ => (StatusCode::NOT_FOUND, Html("<body>unknown</body>".to_string())),
    }
}

pub fn status_service(pool: &DbPool, upstream: &UpstreamConfig) -> StatusService {
    let repository = Arc::new(MappingsRepository::new(pool.clone()));
    let client = StatusClient::new(upstream).unwrap();
    StatusService::new(repository, client, upstream.concurrency)
}

pub fn test_router(pool: &DbPool, upstream: &UpstreamConfig) -> Router {
    let repository = Arc::new(MappingsRepository::new(pool.clone()));
    let client = StatusClient::new(upstream).unwrap();
    let service = StatusService::new(repository.clone(), client, upstream.concurrency);

    create_router(AppState::new(repository, service), &CorsConfig::default())
}
