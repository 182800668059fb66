//! Admin service: server status and persisted system config.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::error::ServiceError;
use super::{ServiceRegistrar, ServiceState};
use crate::store::{HTTPS_PORT, HTTP_PORT};

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub version: String,
    pub http_port: Option<String>,
    pub https_port: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigValueResponse {
    pub key: String,
    pub value: String,
}

/// Service status with the ports the server persisted on startup
pub async fn status(State(state): State<ServiceState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        http_port: state.store.config_cache(HTTP_PORT),
        https_port: state.store.config_cache(HTTPS_PORT),
    })
}

/// Read a single persisted config value
pub async fn config_value(
    State(state): State<ServiceState>,
    Path(key): Path<String>,
) -> Result<Json<ConfigValueResponse>, ServiceError> {
    let value = state
        .store
        .config_cache(&key)
        .ok_or_else(|| ServiceError::NotFound(format!("Config key '{}' not set", key)))?;

    Ok(Json(ConfigValueResponse { key, value }))
}

pub struct AdminService {
    state: ServiceState,
}

impl AdminService {
    pub fn new(state: ServiceState) -> Self {
        Self { state }
    }
}

impl ServiceRegistrar for AdminService {
    fn register(&self, router: Router) -> Router {
        let routes = Router::new()
            .route("/admin", get(status))
            .route("/admin/config/:key", get(config_value))
            .with_state(self.state.clone());

        router.merge(routes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Subsystem;
    use crate::store::{ConfigStore, FileConfigStore};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn open_state(temp_dir: &TempDir) -> ServiceState {
        let store = Arc::new(FileConfigStore::new(temp_dir.path().join("system.json")));
        store.init().unwrap();
        store.put_config(HTTP_PORT, "8080").unwrap();
        ServiceState::new(store, temp_dir.path().join("content"))
    }

    #[tokio::test]
    async fn test_status_reports_persisted_ports() {
        let temp_dir = TempDir::new().unwrap();
        let resp = status(State(open_state(&temp_dir))).await;

        assert_eq!(resp.status, "ok");
        assert_eq!(resp.http_port.as_deref(), Some("8080"));
        assert_eq!(resp.https_port, None);
    }

    #[tokio::test]
    async fn test_config_value() {
        let temp_dir = TempDir::new().unwrap();
        let Json(resp) = config_value(State(open_state(&temp_dir)), Path(HTTP_PORT.to_string()))
            .await
            .unwrap();
        assert_eq!(resp.value, "8080");
    }

    #[tokio::test]
    async fn test_missing_config_value_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let router = AdminService::new(open_state(&temp_dir)).register(Router::new());

        let response = router
            .oneshot(
                Request::get("/admin/config/https_port")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
