//! Delivery records.

use serde::de::IgnoredAny;
use tracing::debug;
use trustmart_core::{HttpResult, NewDelivery};
use trustmart_http::HttpClient;

/// Delivery endpoints.
#[derive(Debug, Clone)]
pub struct DeliveriesApi {
    http: HttpClient,
}

impl DeliveriesApi {
    /// Create over a request layer.
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Attach pickup and delivery details to a product.
    pub async fn create(&self, delivery: &NewDelivery) -> HttpResult<()> {
        let _: IgnoredAny = self.http.post("/deliveries", Some(delivery), None).await?;
        debug!(product_id = delivery.product_id, "Delivery record created");
        Ok(())
    }
}
