//! HTTP implementation of the catalog client.
//!
//! Thin reqwest-backed transport with safe logging: one log line per request
//! carrying method, path, status and duration — never request bodies, tokens,
//! or auth headers.

use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

use crate::catalog::client::CatalogClient;
use crate::catalog::entities::{
    Category, CustomerGroup, CustomerGroupDraft, Product, ProductDraft, ProductType, TaxCategory,
    TaxCategoryDraft,
};
use crate::error::AppError;

use async_trait::async_trait;

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// User agent string for all catalog API requests.
const CLIENT_USER_AGENT: &str = "catalog-stampede/0.1.0";

/// Default request timeout in seconds (transport-level; blocking-wait bounds
/// are applied per operation by the callers).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

// ─────────────────────────────────────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────────────────────────────────────

/// Envelope for paginated query responses.
#[derive(Debug, Deserialize)]
struct PagedResponse<T> {
    results: Vec<T>,
}

/// Request body for the publish state transition.
#[derive(Debug, Serialize)]
struct PublishRequest {
    version: u64,
}

/// Catalog service error response format.
#[derive(Debug, Deserialize)]
struct ServiceError {
    message: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// HttpCatalogClient
// ─────────────────────────────────────────────────────────────────────────────

/// reqwest-backed catalog client.
pub struct HttpCatalogClient {
    http: reqwest::Client,
    base_url: Url,
    api_token: SecretString,
}

impl HttpCatalogClient {
    /// Creates a new client for the given service base URL.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Internal` if the HTTP client fails to initialize.
    pub fn new(base_url: Url, api_token: SecretString) -> Result<Self, AppError> {
        Ok(Self {
            http: build_http_client()?,
            base_url,
            api_token,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, AppError> {
        self.base_url
            .join(path)
            .map_err(|_| AppError::Internal(format!("Invalid path: {}", path)))
    }

    /// Executes a request with timing and safe logging, returning the
    /// deserialized JSON body on success.
    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<serde_json::Value>,
    ) -> Result<T, AppError> {
        let mut url = self.endpoint(path)?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }

        let mut request = self
            .http
            .request(method.clone(), url)
            .bearer_auth(self.api_token.expose_secret());
        if let Some(body) = body {
            request = request.json(&body);
        }

        let start = Instant::now();
        let result = request.send().await;
        let duration_ms = start.elapsed().as_millis();

        let response = match result {
            Ok(response) => response,
            Err(_) => {
                info!("[CATALOG] {} {} FAILED {}ms", method, path, duration_ms);
                return Err(AppError::ConnectionFailed(
                    "Connection to catalog service failed".to_string(),
                ));
            }
        };

        let status = response.status();
        info!(
            "[CATALOG] {} {} {} {}ms",
            method,
            path,
            status.as_u16(),
            duration_ms
        );

        if !status.is_success() {
            return Err(parse_error_response(response, status).await);
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AppError::Remote(format!("Failed to parse response for {}: {}", path, e)))
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        after_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<T>, AppError> {
        let mut query = vec![("limit", limit.to_string()), ("sort", "id asc".to_string())];
        if let Some(after) = after_id {
            query.push(("after", after.to_string()));
        }
        let page: PagedResponse<T> = self.execute(Method::GET, path, &query, None).await?;
        Ok(page.results)
    }

    async fn get_by_name<T: DeserializeOwned>(
        &self,
        path: &str,
        name: &str,
    ) -> Result<Vec<T>, AppError> {
        let query = [("name", name.to_string())];
        let page: PagedResponse<T> = self.execute(Method::GET, path, &query, None).await?;
        Ok(page.results)
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, AppError> {
        let body = serde_json::to_value(body)
            .map_err(|e| AppError::Internal(format!("Failed to serialize request body: {}", e)))?;
        self.execute(Method::POST, path, &[], Some(body)).await
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn customer_groups_by_name(&self, name: &str) -> Result<Vec<CustomerGroup>, AppError> {
        self.get_by_name("/customer-groups", name).await
    }

    async fn create_customer_group(
        &self,
        draft: CustomerGroupDraft,
    ) -> Result<CustomerGroup, AppError> {
        self.post("/customer-groups", &draft).await
    }

    async fn tax_categories_by_name(&self, name: &str) -> Result<Vec<TaxCategory>, AppError> {
        self.get_by_name("/tax-categories", name).await
    }

    async fn create_tax_category(&self, draft: TaxCategoryDraft) -> Result<TaxCategory, AppError> {
        self.post("/tax-categories", &draft).await
    }

    async fn categories_page(
        &self,
        after_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Category>, AppError> {
        self.get_page("/categories", after_id, limit).await
    }

    async fn product_types_page(
        &self,
        after_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ProductType>, AppError> {
        self.get_page("/product-types", after_id, limit).await
    }

    async fn products_page(
        &self,
        after_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Product>, AppError> {
        self.get_page("/products", after_id, limit).await
    }

    async fn create_product(&self, draft: ProductDraft) -> Result<Product, AppError> {
        self.post("/products", &draft).await
    }

    async fn publish_product(&self, id: &str, version: u64) -> Result<Product, AppError> {
        let path = format!("/products/{}/publish", id);
        self.post(&path, &PublishRequest { version }).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Maps a non-2xx response to `AppError::Remote`, using the service's error
/// message when the body is parseable.
async fn parse_error_response(
    response: reqwest::Response,
    status: reqwest::StatusCode,
) -> AppError {
    match response.json::<ServiceError>().await {
        Ok(err) => AppError::Remote(format!("{} ({})", err.message, status.as_u16())),
        Err(_) => AppError::Remote(format!("Request failed with status {}", status.as_u16())),
    }
}

/// Builds the configured HTTP client.
fn build_http_client() -> Result<reqwest::Client, AppError> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))
}
