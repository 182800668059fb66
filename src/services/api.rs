//! Public content API.

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use super::error::ServiceError;
use super::{ServiceRegistrar, ServiceState};
use crate::generate::{list_content_types, ContentType};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ContentTypesResponse {
    pub types: Vec<ContentType>,
}

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// List content type definitions
pub async fn contents(
    State(state): State<ServiceState>,
) -> Result<Json<ContentTypesResponse>, ServiceError> {
    let types = list_content_types(&state.content_dir)?;
    Ok(Json(ContentTypesResponse { types }))
}

pub struct ApiService {
    state: ServiceState,
}

impl ApiService {
    pub fn new(state: ServiceState) -> Self {
        Self { state }
    }
}

impl ServiceRegistrar for ApiService {
    fn register(&self, router: Router) -> Router {
        let routes = Router::new()
            .route("/api/health", get(health))
            .route("/api/contents", get(contents))
            .with_state(self.state.clone())
            .layer(CorsLayer::permissive());

        router.merge(routes)
    }
}
