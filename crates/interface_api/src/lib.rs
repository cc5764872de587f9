//! HTTP API Layer
//!
//! REST boundary for the bill audit service using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: audit creation, retrieval and purge, plus health
//! - **Middleware**: request logging, `Cache-Control: no-store` on reports
//! - **Session store**: finished reports, kept for a fixed time-to-live
//! - **Error Handling**: consistent JSON error bodies
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::new(config);
//! let app = create_router(state);
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod session;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use core_kernel::AuditId;
use domain_report::{AuditPipeline, AuditReport};

use crate::config::ApiConfig;
use crate::handlers::{audits, health};
use crate::middleware::{no_store_middleware, request_log_middleware};
use crate::session::SessionStore;

/// Stored reports, keyed by audit id
pub type ReportStore = SessionStore<AuditId, AuditReport>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub pipeline: AuditPipeline,
    pub sessions: ReportStore,
}

impl AppState {
    /// State with the standard pipeline and an empty store using the configured TTL
    pub fn new(config: ApiConfig) -> Self {
        let sessions = SessionStore::new(config.session_ttl());
        Self {
            config,
            pipeline: AuditPipeline::new(),
            sessions,
        }
    }
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new().route("/health", get(health::health_check));

    let audit_routes = Router::new()
        .route("/", post(audits::create_audit))
        .route("/:id", get(audits::get_audit).delete(audits::delete_audit))
        .layer(axum_middleware::from_fn(no_store_middleware));

    let api_routes = Router::new()
        .nest("/audits", audit_routes)
        .layer(axum_middleware::from_fn(request_log_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(state.config.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
