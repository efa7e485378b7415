//! Domain records exchanged with the marketplace backend.
//!
//! Field names follow the wire format: users are camelCase, products and
//! deliveries are snake_case with camelCase timestamps.

use chrono::{DateTime, Utc};
use serde::de::{self, Unexpected};
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

/// A user as returned by the users endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiUser {
    /// User id.
    pub id: u64,
    /// Email address.
    pub email: String,
    /// Display handle.
    #[serde(default)]
    pub username: Option<String>,
    /// Role names.
    #[serde(default)]
    pub roles: Vec<String>,
    /// External wallet address.
    #[serde(default)]
    pub wallet_address: Option<String>,
    /// Smart account address.
    #[serde(default)]
    pub smart_account_address: Option<String>,
    /// Smart account balance, as a decimal string.
    #[serde(default)]
    pub smart_account_balance: Option<String>,
    /// Country.
    #[serde(default)]
    pub country: Option<String>,
    /// Whether the email has been verified.
    #[serde(default, rename = "isverified")]
    pub is_verified: Option<bool>,
    /// Creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// The subset of a user kept by the auth session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    /// User id.
    pub id: u64,
    /// Email address.
    pub email: String,
    /// Display handle.
    pub username: Option<String>,
    /// Role names.
    pub roles: Vec<String>,
    /// External wallet address. Not part of the login payload.
    pub wallet_address: Option<String>,
    /// Smart account address.
    pub smart_account_address: Option<String>,
    /// Smart account balance, as a decimal string.
    pub smart_account_balance: Option<String>,
}

impl From<ApiUser> for AuthUser {
    fn from(user: ApiUser) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            roles: user.roles,
            wallet_address: user.wallet_address,
            smart_account_address: user.smart_account_address,
            smart_account_balance: user.smart_account_balance,
        }
    }
}

/// Listing status of a product.
///
/// Unknown backend values are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProductStatus {
    /// Listed on the marketplace.
    Active,
    /// Awaiting review.
    Pending,
    /// Any other status string.
    Other(String),
}

impl From<String> for ProductStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "active" => Self::Active,
            "pending" => Self::Pending,
            _ => Self::Other(value),
        }
    }
}

impl From<ProductStatus> for String {
    fn from(status: ProductStatus) -> Self {
        match status {
            ProductStatus::Active => "active".to_string(),
            ProductStatus::Pending => "pending".to_string(),
            ProductStatus::Other(s) => s,
        }
    }
}

/// Seller summary nested in marketplace listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellerSummary {
    /// Seller user id.
    pub id: u64,
    /// Seller handle.
    #[serde(default)]
    pub username: Option<String>,
}

/// A product listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Product id.
    pub id: u64,
    /// Owning seller. The backend sends this as either a number or a string.
    #[serde(deserialize_with = "id_string")]
    pub seller_id: String,
    /// Product name.
    pub name: String,
    /// Rich-text (HTML) description.
    pub description: String,
    /// Pinned image content ids.
    #[serde(default)]
    pub image_cid: Vec<String>,
    /// Unit price. Decimal strings such as `"12.50"` are accepted.
    #[serde(deserialize_with = "number_or_string")]
    pub price: f64,
    /// Units in stock.
    #[serde(deserialize_with = "number_or_string")]
    pub quantity: u32,
    /// ISO currency code.
    pub currency: String,
    /// Listing status.
    pub status: ProductStatus,
    /// Score from the backend's verification model, once computed.
    #[serde(default, deserialize_with = "optional_number_or_string")]
    pub ai_verification_score: Option<f64>,
    /// Creation time.
    #[serde(default, rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time.
    #[serde(default, rename = "updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Seller summary, on marketplace listings.
    #[serde(default)]
    pub seller: Option<SellerSummary>,
}

/// Deserialize an id the backend may send as a number or a string.
pub fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Number(u64),
        Text(String),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Number(n) => n.to_string(),
        Id::Text(s) => s,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText<N> {
    Number(N),
    Text(String),
}

impl<N: FromStr> NumberOrText<N> {
    fn into_number<E: de::Error>(self) -> Result<N, E> {
        match self {
            Self::Number(n) => Ok(n),
            Self::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| E::invalid_value(Unexpected::Str(&s), &"a number")),
        }
    }
}

/// Deserialize a number the backend may send as a JSON number or as a
/// numeric string.
pub fn number_or_string<'de, D, N>(deserializer: D) -> Result<N, D::Error>
where
    D: Deserializer<'de>,
    N: Deserialize<'de> + FromStr,
{
    NumberOrText::<N>::deserialize(deserializer)?.into_number()
}

/// Like [`number_or_string`], with `null` mapping to `None`.
pub fn optional_number_or_string<'de, D, N>(deserializer: D) -> Result<Option<N>, D::Error>
where
    D: Deserializer<'de>,
    N: Deserialize<'de> + FromStr,
{
    Option::<NumberOrText<N>>::deserialize(deserializer)?
        .map(NumberOrText::into_number)
        .transpose()
}

/// Page metadata on listing responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Current page, starting at 1.
    pub page: u32,
    /// Page size.
    pub limit: u32,
    /// Total matching records.
    pub total: u64,
    /// Total pages.
    pub pages: u32,
}

/// One page of products.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPage {
    /// Products on this page.
    pub products: Vec<Product>,
    /// Paging metadata.
    pub pagination: Pagination,
}

/// Body of a product creation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    /// Owning seller.
    pub seller_id: u64,
    /// Product name.
    pub name: String,
    /// Rich-text (HTML) description.
    pub description: String,
    /// Pinned image content ids, in upload order.
    pub image_cid: Vec<String>,
    /// Unit price.
    pub price: f64,
    /// Units in stock.
    pub quantity: u32,
    /// ISO currency code.
    pub currency: String,
}

/// Partial product update. Unset fields are left alone by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateProduct {
    /// New name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New unit price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    /// New stock count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    /// New currency code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// New listing status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProductStatus>,
}

/// Body of a delivery record request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDelivery {
    /// Product being shipped.
    pub product_id: u64,
    /// Where the courier collects the item.
    pub pickup_location: String,
    /// Expected days until delivery.
    pub estimated_delivery_days: u32,
    /// Free-form notes for the courier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
