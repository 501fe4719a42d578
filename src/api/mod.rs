//! Public HTTP surface: the newsletter subscribe endpoint and a health check.

mod subscribe;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::services::BeehiivClient;

/// Read-only context shared by handlers. Nothing here changes between requests.
pub struct ApiState {
    pub beehiiv_publication_id: Option<String>,
    pub beehiiv_api_key: Option<String>,
    pub http_client: reqwest::Client,
}

impl ApiState {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            beehiiv_publication_id: config.beehiiv_publication_id.clone(),
            beehiiv_api_key: config.beehiiv_api_key.clone(),
            http_client: BeehiivClient::http_client()?,
        })
    }
}

pub fn router(state: Arc<ApiState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/subscribe", post(subscribe::subscribe))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn serve(config: &Config) -> Result<()> {
    let state = Arc::new(ApiState::from_config(config)?);
    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .map_err(|e| AppError::Config(format!("Cannot bind {}: {}", config.bind_addr, e)))?;

    info!("Listening on {}", config.bind_addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    pub(super) fn state(publication_id: Option<&str>, api_key: Option<&str>) -> Arc<ApiState> {
        Arc::new(ApiState {
            beehiiv_publication_id: publication_id.map(str::to_string),
            beehiiv_api_key: api_key.map(str::to_string),
            http_client: reqwest::Client::new(),
        })
    }

    #[tokio::test]
    async fn test_health() {
        let response = router(state(None, None))
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = router(state(None, None))
            .oneshot(Request::get("/api/tools").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
