//! Profile statistics endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use checkout::InventoryClient;
use stats::{BuyerStats, SellerStats};
use store::{CartStore, OrderStore};

use crate::error::ApiError;
use crate::identity::Identity;
use crate::routes::orders::AppState;

/// GET /profile/stats — the caller's purchase statistics.
pub async fn buyer_stats<
    O: OrderStore + 'static,
    C: CartStore + 'static,
    I: InventoryClient + 'static,
>(
    State(state): State<Arc<AppState<O, C, I>>>,
    Identity(caller): Identity,
) -> Result<Json<BuyerStats>, ApiError> {
    let stats = state.stats.buyer_stats(&caller).await?;
    Ok(Json(stats))
}

/// GET /profile/seller-stats — the caller's sales statistics.
pub async fn seller_stats<
    O: OrderStore + 'static,
    C: CartStore + 'static,
    I: InventoryClient + 'static,
>(
    State(state): State<Arc<AppState<O, C, I>>>,
    Identity(caller): Identity,
) -> Result<Json<SellerStats>, ApiError> {
    let stats = state.stats.seller_stats(&caller).await?;
    Ok(Json(stats))
}
