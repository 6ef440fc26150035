//! REST API exposure
//!
//! Consumes a [`SalesService`] and produces an Axum `Router`:
//!
//! - `GET /health`, `GET /healthz` : liveness
//! - `GET /api/sales` : filtered, sorted, paginated rows
//! - `GET /api/meta` : distinct filter values

use super::super::host::SalesService;
use crate::core::catalog::MetadataCatalog;
use crate::core::error::{ConfigError, ServiceError};
use crate::core::query::{ResultPage, SalesQuery};
use anyhow::Result;
use axum::extract::{Query, State};
use axum::http::{HeaderValue, Method};
use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// REST API exposure implementation
pub struct RestExposure;

impl RestExposure {
    /// Build the REST router from a service
    ///
    /// `allowed_origins` is the CORS allow-list; a `*` entry allows any
    /// origin.
    pub fn build_router(
        service: Arc<SalesService>,
        allowed_origins: &[String],
        custom_routes: Vec<Router>,
    ) -> Result<Router> {
        let mut app = Self::health_routes().merge(Self::api_routes(service));

        for custom_router in custom_routes {
            app = app.merge(custom_router);
        }

        Ok(app
            .layer(Self::cors_layer(allowed_origins)?)
            .layer(TraceLayer::new_for_http()))
    }

    fn api_routes(service: Arc<SalesService>) -> Router {
        Router::new()
            .route("/api/sales", get(Self::list_sales))
            .route("/api/meta", get(Self::metadata))
            .with_state(service)
    }

    /// Build health check routes
    fn health_routes() -> Router {
        Router::new()
            .route("/health", get(Self::health_check))
            .route("/healthz", get(Self::health_check))
    }

    fn cors_layer(allowed_origins: &[String]) -> Result<CorsLayer, ConfigError> {
        let layer = CorsLayer::new()
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers(Any);

        if allowed_origins.iter().any(|o| o == "*") {
            return Ok(layer.allow_origin(Any));
        }

        let origins = allowed_origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin).map_err(|e| ConfigError::InvalidValue {
                    key: "server.allowed_origins".to_string(),
                    message: format!("{}: {}", origin, e),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(layer.allow_origin(AllowOrigin::list(origins)))
    }

    /// Health check endpoint handler
    async fn health_check() -> Json<Value> {
        Json(json!({
            "status": "ok",
            "service": "sales-query"
        }))
    }

    /// Query pairs are kept in order so repeated keys accumulate
    async fn list_sales(
        State(service): State<Arc<SalesService>>,
        Query(pairs): Query<Vec<(String, String)>>,
    ) -> Result<Json<ResultPage>, ServiceError> {
        let query = SalesQuery::from_pairs(pairs)?;
        Ok(Json(service.search(&query).await?))
    }

    async fn metadata(State(service): State<Arc<SalesService>>) -> Json<MetadataCatalog> {
        Json(service.metadata().await)
    }
}
