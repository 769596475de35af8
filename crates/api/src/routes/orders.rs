//! Order lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use checkout::{CartService, CheckoutOrchestrator, InventoryClient};
use common::OrderId;
use domain::{Order, OrderStatus, ShippingAddress};
use serde::Deserialize;
use stats::ProfileStatsService;
use store::{CartStore, OrderStore, Page};

use crate::error::ApiError;
use crate::identity::Identity;

/// Shared application state accessible from all handlers.
pub struct AppState<O, C, I>
where
    O: OrderStore,
    C: CartStore,
    I: InventoryClient,
{
    pub orchestrator: CheckoutOrchestrator<O, C, I>,
    pub carts: CartService<C, I>,
    pub stats: ProfileStatsService<O>,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CheckoutRequest {
    pub shipping_address: ShippingAddress,
    #[serde(default)]
    pub delivery_notes: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
}

#[derive(Deserialize)]
pub struct CancelRequest {
    pub reason: String,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct ListQuery {
    pub offset: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<String>,
}

impl ListQuery {
    fn page(&self) -> Page {
        Page::new(self.offset.unwrap_or(0), self.limit.unwrap_or(20))
    }

    fn status_filter(&self) -> Result<Option<OrderStatus>, ApiError> {
        self.status
            .as_deref()
            .map(|s| {
                OrderStatus::parse(s)
                    .ok_or_else(|| ApiError::BadRequest(format!("Unknown status: {s}")))
            })
            .transpose()
    }
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    id.parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid order id: {id}")))
}

// -- Handlers --

/// POST /orders/checkout — convert the caller's cart into an order.
pub async fn checkout<O: OrderStore + 'static, C: CartStore + 'static, I: InventoryClient + 'static>(
    State(state): State<Arc<AppState<O, C, I>>>,
    Identity(caller): Identity,
    Json(req): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let order = state
        .orchestrator
        .checkout(
            &caller,
            req.shipping_address,
            req.delivery_notes,
            req.payment_method,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /orders — list the caller's orders, newest first.
pub async fn list<O: OrderStore + 'static, C: CartStore + 'static, I: InventoryClient + 'static>(
    State(state): State<Arc<AppState<O, C, I>>>,
    Identity(caller): Identity,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let orders = state
        .orchestrator
        .list_buyer_orders(&caller, query.page())
        .await?;
    Ok(Json(orders))
}

/// GET /orders/:id — load one order.
pub async fn get<O: OrderStore + 'static, C: CartStore + 'static, I: InventoryClient + 'static>(
    State(state): State<Arc<AppState<O, C, I>>>,
    Identity(caller): Identity,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.orchestrator.get_order(&caller, order_id).await?;
    Ok(Json(order))
}

/// POST /orders/:id/cancel — cancel an unshipped order.
pub async fn cancel<O: OrderStore + 'static, C: CartStore + 'static, I: InventoryClient + 'static>(
    State(state): State<Arc<AppState<O, C, I>>>,
    Identity(caller): Identity,
    Path(id): Path<String>,
    Json(req): Json<CancelRequest>,
) -> Result<Json<Order>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state
        .orchestrator
        .cancel_order(&caller, order_id, &req.reason)
        .await?;
    Ok(Json(order))
}

/// POST /orders/:id/redo — place a cancelled order again at today's prices.
pub async fn redo<O: OrderStore + 'static, C: CartStore + 'static, I: InventoryClient + 'static>(
    State(state): State<Arc<AppState<O, C, I>>>,
    Identity(caller): Identity,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.orchestrator.redo_order(&caller, order_id).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// DELETE /orders/:id — soft-delete a finished order from history.
pub async fn remove<O: OrderStore + 'static, C: CartStore + 'static, I: InventoryClient + 'static>(
    State(state): State<Arc<AppState<O, C, I>>>,
    Identity(caller): Identity,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let order_id = parse_order_id(&id)?;
    state.orchestrator.remove_order(&caller, order_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /orders/:id/status — move an order along its lifecycle.
pub async fn update_status<
    O: OrderStore + 'static,
    C: CartStore + 'static,
    I: InventoryClient + 'static,
>(
    State(state): State<Arc<AppState<O, C, I>>>,
    Identity(caller): Identity,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Order>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let target = OrderStatus::parse(&req.status)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown status: {}", req.status)))?;
    let order = state
        .orchestrator
        .update_status(&caller, order_id, target, req.reason)
        .await?;
    Ok(Json(order))
}

/// GET /seller/orders — list orders containing the caller's items.
pub async fn seller_list<
    O: OrderStore + 'static,
    C: CartStore + 'static,
    I: InventoryClient + 'static,
>(
    State(state): State<Arc<AppState<O, C, I>>>,
    Identity(caller): Identity,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let status = query.status_filter()?;
    let orders = state
        .orchestrator
        .list_seller_orders(&caller, status, query.page())
        .await?;
    Ok(Json(orders))
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub keyword: String,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

/// GET /seller/orders/search — search the caller's sales by order number
/// or buyer email.
pub async fn seller_search<
    O: OrderStore + 'static,
    C: CartStore + 'static,
    I: InventoryClient + 'static,
>(
    State(state): State<Arc<AppState<O, C, I>>>,
    Identity(caller): Identity,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let page = Page::new(query.offset.unwrap_or(0), query.limit.unwrap_or(20));
    let orders = state
        .orchestrator
        .search_seller_orders(&caller, &query.keyword, page)
        .await?;
    Ok(Json(orders))
}
