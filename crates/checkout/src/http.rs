//! HTTP implementation of the inventory client.

use std::time::Duration;

use async_trait::async_trait;
use common::ProductId;
use reqwest::StatusCode;
use serde::Serialize;

use crate::inventory::{
    InventoryClient, InventoryError, ProductSnapshot, StockAdjustment, StockBatchOutcome,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
struct AdjustmentRequest<'a> {
    items: &'a [StockAdjustment],
}

/// Inventory client backed by the product service's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpInventoryClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpInventoryClient {
    /// Creates a client for the inventory service at `base_url`.
    ///
    /// All requests carry a bounded timeout so a slow inventory service
    /// cannot stall checkout indefinitely.
    pub fn new(base_url: impl Into<String>) -> Result<Self, InventoryError> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| InventoryError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn map_error(e: reqwest::Error) -> InventoryError {
        if e.is_timeout() {
            InventoryError::Timeout
        } else if e.is_decode() {
            InventoryError::MalformedResponse(e.to_string())
        } else {
            InventoryError::Unavailable(e.to_string())
        }
    }

    async fn post_adjustments(
        &self,
        path: &str,
        adjustments: &[StockAdjustment],
    ) -> Result<StockBatchOutcome, InventoryError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(&AdjustmentRequest { items: adjustments })
            .send()
            .await
            .map_err(Self::map_error)?;

        if !response.status().is_success() {
            return Err(InventoryError::Unavailable(format!(
                "{} answered {}",
                path,
                response.status()
            )));
        }

        response
            .json::<StockBatchOutcome>()
            .await
            .map_err(Self::map_error)
    }
}

#[async_trait]
impl InventoryClient for HttpInventoryClient {
    async fn fetch_product(
        &self,
        product_id: &ProductId,
    ) -> Result<Option<ProductSnapshot>, InventoryError> {
        let url = format!("{}/products/{}", self.base_url, product_id);
        let response = self.client.get(&url).send().await.map_err(Self::map_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(InventoryError::Unavailable(format!(
                "product lookup answered {}",
                response.status()
            )));
        }

        let product = response
            .json::<ProductSnapshot>()
            .await
            .map_err(Self::map_error)?;
        Ok(Some(product))
    }

    async fn decrement_stock(
        &self,
        adjustments: &[StockAdjustment],
    ) -> Result<StockBatchOutcome, InventoryError> {
        self.post_adjustments("/internal/decrement-stock", adjustments)
            .await
    }

    async fn increment_stock(
        &self,
        adjustments: &[StockAdjustment],
    ) -> Result<StockBatchOutcome, InventoryError> {
        self.post_adjustments("/internal/increment-stock", adjustments)
            .await
    }
}
