//! Client for the remote things catalog.
//!
//! Every endpoint takes the access token as a query parameter. Responses are
//! decoded into the typed records in [`types`]; an absent response and a
//! non-200 status both surface as an [`ApiError`].

pub mod error;
pub mod fetch;
pub mod types;

#[cfg(test)]
pub(crate) mod mock;

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use error::ApiError;
pub use fetch::{redact_token, Fetcher};
pub use types::{FileDescriptor, ImageDescriptor, Thing, ThingSummary};

/// Query parameter carrying the access token.
pub(crate) const TOKEN_PARAM: &str = "access_token";

pub const DEFAULT_BASE_URL: &str = "https://api.thingiverse.com";

pub struct ThingsApi {
    base_url: String,
    token: String,
    fetcher: Fetcher,
}

impl ThingsApi {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>, fetcher: Fetcher) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
            fetcher,
        }
    }

    fn endpoint(&self, path: &str, page: Option<u32>) -> Result<String, ApiError> {
        let raw = format!("{}/{}", self.base_url, path);
        let mut url = Url::parse(&raw).map_err(|e| ApiError::InvalidUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair(TOKEN_PARAM, &self.token);
            if let Some(page) = page {
                query.append_pair("page", &page.to_string());
            }
        }
        Ok(url.into())
    }

    /// Fetch `url` and require a 200 response.
    async fn get_ok(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let resp = self
            .fetcher
            .fetch(url)
            .await
            .ok_or_else(|| ApiError::NoResponse {
                url: redact_token(url),
            })?;
        if !resp.is_success() {
            return Err(ApiError::HttpStatus {
                status: resp.status,
                url: redact_token(url),
            });
        }
        Ok(resp.body)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let body = self.get_ok(url).await?;
        serde_json::from_slice(&body).map_err(|source| ApiError::Json {
            url: redact_token(url),
            source,
        })
    }

    /// One page of a collection listing. An empty page ends pagination.
    pub async fn collection_things(
        &self,
        collection_id: u64,
        page: u32,
    ) -> Result<Vec<ThingSummary>, ApiError> {
        let url = self.endpoint(&format!("collections/{}/things/", collection_id), Some(page))?;
        self.get_json(&url).await
    }

    pub async fn thing(&self, thing_id: u64) -> Result<Thing, ApiError> {
        let url = self.endpoint(&format!("things/{}/", thing_id), None)?;
        self.get_json(&url).await
    }

    /// Remix lineage, kept as raw JSON. No page parameter is sent.
    pub async fn ancestors(&self, thing_id: u64) -> Result<Value, ApiError> {
        let url = self.endpoint(&format!("things/{}/ancestors/", thing_id), None)?;
        self.get_json(&url).await
    }

    pub async fn images(&self, thing_id: u64) -> Result<Vec<ImageDescriptor>, ApiError> {
        let url = self.endpoint(&format!("things/{}/images/", thing_id), None)?;
        self.get_json(&url).await
    }

    pub async fn files(&self, thing_id: u64) -> Result<Vec<FileDescriptor>, ApiError> {
        let url = self.endpoint(&format!("things/{}/files/", thing_id), None)?;
        self.get_json(&url).await
    }

    /// Download the bytes of an image rendition. CDN URLs need no token.
    pub async fn download_image(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        self.get_ok(url).await
    }

    /// Download an attached file, appending the access token to its URL.
    pub async fn download_file(&self, download_url: &str) -> Result<Vec<u8>, ApiError> {
        let mut url = Url::parse(download_url).map_err(|e| ApiError::InvalidUrl {
            url: download_url.to_string(),
            reason: e.to_string(),
        })?;
        url.query_pairs_mut().append_pair(TOKEN_PARAM, &self.token);
        self.get_ok(url.as_str()).await
    }
}
