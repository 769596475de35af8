//! HTTP API server for the cart and checkout subsystem.
//!
//! Exposes REST endpoints for carts, orders, and profile statistics,
//! with structured logging (tracing) and Prometheus metrics. Identity
//! arrives in gateway headers; see [`identity`].

pub mod config;
pub mod error;
pub mod identity;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post, put};
use checkout::{
    CartService, CheckoutOrchestrator, HttpInventoryClient, InMemoryInventoryClient,
    InventoryClient,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;
use stats::ProfileStatsService;
use store::{
    CartStore, InMemoryCartStore, InMemoryOrderStore, OrderStore, PostgresCartStore,
    PostgresOrderStore,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<O, C, I>(state: Arc<AppState<O, C, I>>, metrics_handle: PrometheusHandle) -> Router
where
    O: OrderStore + 'static,
    C: CartStore + 'static,
    I: InventoryClient + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/cart",
            get(routes::cart::get::<O, C, I>).delete(routes::cart::clear::<O, C, I>),
        )
        .route("/cart/items", post(routes::cart::add_item::<O, C, I>))
        .route(
            "/cart/items/{product_id}",
            put(routes::cart::update_item::<O, C, I>)
                .delete(routes::cart::remove_item::<O, C, I>),
        )
        .route("/orders/checkout", post(routes::orders::checkout::<O, C, I>))
        .route("/orders", get(routes::orders::list::<O, C, I>))
        .route(
            "/orders/{id}",
            get(routes::orders::get::<O, C, I>).delete(routes::orders::remove::<O, C, I>),
        )
        .route("/orders/{id}/cancel", post(routes::orders::cancel::<O, C, I>))
        .route("/orders/{id}/redo", post(routes::orders::redo::<O, C, I>))
        .route(
            "/orders/{id}/status",
            patch(routes::orders::update_status::<O, C, I>),
        )
        .route("/seller/orders", get(routes::orders::seller_list::<O, C, I>))
        .route(
            "/seller/orders/search",
            get(routes::orders::seller_search::<O, C, I>),
        )
        .route("/profile/stats", get(routes::profile::buyer_stats::<O, C, I>))
        .route(
            "/profile/seller-stats",
            get(routes::profile::seller_stats::<O, C, I>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// In-memory application state for development and tests.
///
/// Returns the inventory client alongside the state so callers can seed
/// products.
pub fn create_default_state() -> (
    Arc<AppState<InMemoryOrderStore, InMemoryCartStore, InMemoryInventoryClient>>,
    InMemoryInventoryClient,
) {
    let orders = InMemoryOrderStore::new();
    let carts = InMemoryCartStore::new();
    let inventory = InMemoryInventoryClient::new();

    let state = Arc::new(AppState {
        orchestrator: CheckoutOrchestrator::new(orders.clone(), carts.clone(), inventory.clone()),
        carts: CartService::new(carts, inventory.clone()),
        stats: ProfileStatsService::new(orders),
    });
    (state, inventory)
}

/// Production state: PostgreSQL stores and the HTTP inventory client.
///
/// Creates the schema on startup if it is not there yet.
pub async fn create_postgres_state(
    pool: PgPool,
    inventory: HttpInventoryClient,
) -> Result<
    Arc<AppState<PostgresOrderStore, PostgresCartStore, HttpInventoryClient>>,
    store::StoreError,
> {
    let orders = PostgresOrderStore::new(pool.clone());
    let carts = PostgresCartStore::new(pool);
    orders.init_schema().await?;
    carts.init_schema().await?;

    Ok(Arc::new(AppState {
        orchestrator: CheckoutOrchestrator::new(orders.clone(), carts.clone(), inventory.clone()),
        carts: CartService::new(carts, inventory),
        stats: ProfileStatsService::new(orders),
    }))
}
