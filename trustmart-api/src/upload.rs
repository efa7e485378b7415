//! Image pinning to IPFS through the storefront's upload endpoint.

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::debug;
use trustmart_core::{codes, HttpError, HttpResult};
use trustmart_http::{ClientConfig, HttpClient, RequestConfig};

/// An image picked by the user, held in memory until it is pinned.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageFile {
    /// File name, sent as the multipart file name.
    pub name: String,
    /// Declared MIME type, e.g. `image/png`.
    pub content_type: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageFile")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl ImageFile {
    /// Create from a name, declared type and contents.
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Whether the declared type is `image/*`.
    pub fn is_image(&self) -> bool {
        self.content_type
            .parse::<mime::Mime>()
            .map(|m| m.type_() == mime::IMAGE)
            .unwrap_or(false)
    }
}

/// Response of the upload endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PinResponse {
    /// Content ids of the pinned files.
    #[serde(default)]
    pub cids: Vec<String>,
    /// Gateway links, when the endpoint returns them.
    #[serde(default)]
    pub urls: Vec<String>,
}

/// Client for the pinning endpoint and the public gateway.
#[derive(Debug, Clone)]
pub struct UploadApi {
    http: HttpClient,
    upload_url: String,
    gateway_url: String,
}

impl UploadApi {
    /// Create with explicit pinning and gateway endpoints.
    pub fn new(
        http: HttpClient,
        upload_url: impl Into<String>,
        gateway_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            upload_url: upload_url.into(),
            gateway_url: gateway_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Endpoints taken from a client configuration.
    pub fn from_config(http: HttpClient, config: &ClientConfig) -> Self {
        Self::new(http, config.upload_url(), &config.gateway_url)
    }

    /// Pin one image and return its content id.
    ///
    /// The upload endpoint belongs to the storefront, so no backend token is
    /// sent with it.
    pub async fn pin(&self, file: &ImageFile) -> HttpResult<String> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.content_type)
            .map_err(|e| HttpError::new(e.to_string()).with_code(codes::SERIALIZE))?;
        let form = Form::new().part("file", part);

        let response: PinResponse = self
            .http
            .send_multipart(&self.upload_url, form, Some(RequestConfig::anonymous()))
            .await?;

        let cid = response
            .cids
            .into_iter()
            .next()
            .filter(|cid| !cid.is_empty())
            .ok_or_else(|| HttpError::new("No CID returned"))?;
        debug!(file = %file.name, cid = %cid, "Image pinned");
        Ok(cid)
    }

    /// Public URL of pinned content.
    pub fn gateway_url(&self, cid: &str) -> String {
        format!("{}/ipfs/{}", self.gateway_url, cid)
    }
}
