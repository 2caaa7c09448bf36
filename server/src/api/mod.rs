//! API Router and Application State
//!
//! Central routing configuration and shared state.

pub mod upstream;

use std::sync::Arc;

use axum::{
    extract::State,
    middleware::{from_fn, from_fn_with_state},
    routing::{any, get},
    Json, Router,
};
use serde::Serialize;
use sqlx::PgPool;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    access::{filter_sales_channels, with_channel_scope, ChannelAccessStore, ChannelScope},
    admin,
    auth::authenticate_customer,
    config::Config,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,
    /// Server configuration
    pub config: Arc<Config>,
    /// Source of channel grants for the resolver
    pub channel_store: Arc<dyn ChannelAccessStore>,
    /// HTTP client for the catalog upstream
    pub http: reqwest::Client,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(db: PgPool, config: Config, channel_store: Arc<dyn ChannelAccessStore>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            channel_store,
            http: reqwest::Client::new(),
        }
    }
}

/// Storefront routes proxied to the catalog without channel filtering.
const UNFILTERED_STORE_ROUTES: &[&str] = &[
    "/store/collections",
    "/store/product-categories",
    "/store/regions",
];

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Product listings: customer auth, then channel filter (array mode)
    let product_routes = Router::new()
        .route("/store/products", any(upstream::forward))
        .route("/store/products/{*rest}", any(upstream::forward))
        .layer(from_fn_with_state(state.clone(), filter_sales_channels))
        .layer(from_fn(with_channel_scope(ChannelScope::array("products"))))
        .layer(from_fn_with_state(state.clone(), authenticate_customer));

    let other_store_routes = UNFILTERED_STORE_ROUTES
        .iter()
        .fold(Router::new(), |router, path| {
            router
                .route(path, any(upstream::forward))
                .route(&format!("{path}/{{*rest}}"), any(upstream::forward))
        })
        .layer(from_fn_with_state(state.clone(), authenticate_customer));

    let mut router = Router::new()
        // Health check
        .route("/health", get(health_check))
        .merge(product_routes)
        .merge(other_store_routes);

    if state.config.admin_routes_enabled {
        router = router.nest("/admin", admin::router(state.clone()));
    }

    router
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // State
        .with_state(state)
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    /// Service status
    status: &'static str,
    /// Whether sales channel filtering is enabled
    sales_channels: bool,
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        sales_channels: state.config.sales_channels_enabled,
    })
}
