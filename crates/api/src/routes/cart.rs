//! Cart endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use checkout::InventoryClient;
use common::ProductId;
use domain::Cart;
use serde::Deserialize;
use store::{CartStore, OrderStore};

use crate::error::ApiError;
use crate::identity::Identity;
use crate::routes::orders::AppState;

#[derive(Deserialize)]
pub struct AddItemRequest {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: u32,
}

/// GET /cart — the caller's cart, created empty on first access.
pub async fn get<O: OrderStore + 'static, C: CartStore + 'static, I: InventoryClient + 'static>(
    State(state): State<Arc<AppState<O, C, I>>>,
    Identity(caller): Identity,
) -> Result<Json<Cart>, ApiError> {
    let cart = state.carts.get_cart(&caller).await?;
    Ok(Json(cart))
}

/// POST /cart/items — add a product to the cart.
pub async fn add_item<
    O: OrderStore + 'static,
    C: CartStore + 'static,
    I: InventoryClient + 'static,
>(
    State(state): State<Arc<AppState<O, C, I>>>,
    Identity(caller): Identity,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<Cart>, ApiError> {
    let cart = state
        .carts
        .add_item(&caller, &ProductId::new(req.product_id), req.quantity)
        .await?;
    Ok(Json(cart))
}

/// PUT /cart/items/:product_id — set a line's quantity; zero removes it.
pub async fn update_item<
    O: OrderStore + 'static,
    C: CartStore + 'static,
    I: InventoryClient + 'static,
>(
    State(state): State<Arc<AppState<O, C, I>>>,
    Identity(caller): Identity,
    Path(product_id): Path<String>,
    Json(req): Json<UpdateQuantityRequest>,
) -> Result<Json<Cart>, ApiError> {
    let cart = state
        .carts
        .update_quantity(&caller, &ProductId::new(product_id), req.quantity)
        .await?;
    Ok(Json(cart))
}

/// DELETE /cart/items/:product_id — drop a line from the cart.
pub async fn remove_item<
    O: OrderStore + 'static,
    C: CartStore + 'static,
    I: InventoryClient + 'static,
>(
    State(state): State<Arc<AppState<O, C, I>>>,
    Identity(caller): Identity,
    Path(product_id): Path<String>,
) -> Result<Json<Cart>, ApiError> {
    let cart = state
        .carts
        .remove_item(&caller, &ProductId::new(product_id))
        .await?;
    Ok(Json(cart))
}

/// DELETE /cart — empty the cart.
pub async fn clear<O: OrderStore + 'static, C: CartStore + 'static, I: InventoryClient + 'static>(
    State(state): State<Arc<AppState<O, C, I>>>,
    Identity(caller): Identity,
) -> Result<Json<Cart>, ApiError> {
    let cart = state.carts.clear_cart(&caller).await?;
    Ok(Json(cart))
}
