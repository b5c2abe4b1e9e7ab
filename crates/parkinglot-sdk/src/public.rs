//! Unauthenticated client for public read-only endpoints

use crate::error::{ApiError, ErrorBody, Result};
use crate::types::CategoriesResponse;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use std::time::Duration;
use tracing::{debug, error};

const CATEGORIES_FALLBACK_MESSAGE: &str = "Failed to fetch categories";

/// Client that never sends credentials
#[derive(Debug, Clone)]
pub struct PublicClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl PublicClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .default_headers(json_headers())
            .timeout(timeout)
            .build()
            .map_err(ApiError::HttpClient)?;

        Ok(Self::with_http_client(http_client, base_url))
    }

    pub(crate) fn with_http_client(http_client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// List categories. Never fails: errors are logged and reported in-band
    /// with an empty list.
    pub async fn categories(&self) -> CategoriesResponse {
        let url = format!("{}/api/categories", self.base_url);
        debug!("GET {}", url);

        let response = match self.http_client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => return Self::degraded(e.into(), None),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let server_message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.message)
                .filter(|m| !m.is_empty());
            return Self::degraded(ApiError::from_response(status, &body), server_message);
        }

        match response.json::<CategoriesResponse>().await {
            Ok(categories) => categories,
            Err(e) => Self::degraded(e.into(), None),
        }
    }

    fn degraded(err: ApiError, server_message: Option<String>) -> CategoriesResponse {
        error!("Error fetching categories: {}", err);
        CategoriesResponse::failed(
            server_message.unwrap_or_else(|| CATEGORIES_FALLBACK_MESSAGE.to_string()),
        )
    }
}

pub(crate) fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}
