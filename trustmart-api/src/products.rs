//! Product listing and management.

use serde::de::IgnoredAny;
use serde::Deserialize;
use tracing::debug;
use trustmart_core::models::number_or_string;
use trustmart_core::{Envelope, HttpResult, NewProduct, Product, ProductPage, UpdateProduct};
use trustmart_http::{HttpClient, RequestConfig};

/// Default page size for listings.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Payload carrying a single product.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductData {
    /// The product.
    pub product: Product,
}

/// Just the id of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ProductId {
    /// Numeric id. Numeric strings are accepted.
    #[serde(deserialize_with = "number_or_string")]
    pub id: u64,
}

/// `{product: {id}}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ProductRef {
    /// The created product.
    pub product: ProductId,
}

/// Response of `POST /products`.
///
/// Variants are tried in order, from the enveloped form the current backend
/// sends down to a body with no usable id at all.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CreatedProduct {
    /// `{status, data: {product: {id}}}`
    Enveloped(Envelope<ProductRef>),
    /// `{product: {id}}`
    Wrapped(ProductRef),
    /// `{id}`
    Bare(ProductId),
    /// Accepted, but no recognizable id.
    Unidentified(IgnoredAny),
}

impl CreatedProduct {
    /// The created product's id, if the backend sent one.
    pub fn id(&self) -> Option<u64> {
        match self {
            Self::Enveloped(envelope) => Some(envelope.data.product.id),
            Self::Wrapped(wrapped) => Some(wrapped.product.id),
            Self::Bare(bare) => Some(bare.id),
            Self::Unidentified(_) => None,
        }
    }
}

/// Product endpoints.
#[derive(Debug, Clone)]
pub struct ProductsApi {
    http: HttpClient,
}

impl ProductsApi {
    /// Create over a request layer.
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    fn page_query(page: u32, limit: u32) -> RequestConfig {
        RequestConfig::new()
            .with_query("page", page)
            .with_query("limit", limit)
    }

    /// Marketplace listing across all sellers.
    pub async fn list_all(&self, page: u32, limit: u32) -> HttpResult<Envelope<ProductPage>> {
        self.http
            .get("/products", Some(Self::page_query(page, limit)))
            .await
    }

    /// The signed-in seller's products.
    pub async fn my_products(&self, page: u32, limit: u32) -> HttpResult<Envelope<ProductPage>> {
        self.http
            .get(
                "/products/seller/my-products",
                Some(Self::page_query(page, limit)),
            )
            .await
    }

    /// One product by id.
    pub async fn get(&self, id: u64) -> HttpResult<Envelope<ProductData>> {
        self.http.get(&format!("/products/{}", id), None).await
    }

    /// Replace the given fields of a listing.
    pub async fn update(
        &self,
        id: u64,
        update: &UpdateProduct,
    ) -> HttpResult<Envelope<ProductData>> {
        self.http
            .put(&format!("/products/{}", id), Some(update), None)
            .await
    }

    /// Create a listing.
    pub async fn create(&self, product: &NewProduct) -> HttpResult<CreatedProduct> {
        let created: CreatedProduct = self.http.post("/products", Some(product), None).await?;
        debug!(id = ?created.id(), "Product created");
        Ok(created)
    }
}
