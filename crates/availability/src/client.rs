//! HTTP implementation of the reservation service traits.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::AvailabilityError;
use crate::models::{AvailabilitySearch, CatalogResponse, CatalogRestaurant, RestaurantAvailability};
use crate::{AvailabilityClient, RestaurantCatalog};

/// Default HTTP request timeout for a single call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Supplies the bearer token for outbound requests.
///
/// Looked up on every request so a token renewed elsewhere is picked up
/// without restarting the client.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Option<String>;
}

/// Endpoint and header configuration for [`ReservationApi`].
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// POST endpoint of the availability search.
    pub availabilities_endpoint: String,
    /// GraphQL endpoint serving the restaurant catalogue.
    pub graphql_endpoint: Option<String>,
    /// Raw GraphQL request body for the catalogue.
    pub restaurants_query: Option<String>,
    /// Sent as `x-api-key` when non-empty.
    pub api_key: String,
    /// Extra headers added to every request.
    pub custom_headers: Vec<(String, String)>,
    pub timeout: Duration,
}

/// HTTP client for the reservation service.
pub struct ReservationApi {
    client: reqwest::Client,
    config: ApiConfig,
    static_headers: HeaderMap,
    tokens: Option<Arc<dyn TokenSource>>,
}

impl ReservationApi {
    /// Build a client. Custom headers with invalid names or values are
    /// skipped with a warning.
    pub fn new(
        config: ApiConfig,
        tokens: Option<Arc<dyn TokenSource>>,
    ) -> Result<Self, AvailabilityError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        let static_headers = build_static_headers(&config);
        Ok(Self {
            client,
            config,
            static_headers,
            tokens,
        })
    }

    /// Headers for one request: static headers plus the current bearer token.
    async fn request_headers(&self) -> HeaderMap {
        let mut headers = self.static_headers.clone();
        if let Some(tokens) = &self.tokens {
            if let Some(token) = tokens.access_token().await {
                match HeaderValue::from_str(&format!("BEARER {token}")) {
                    Ok(value) => {
                        headers.insert(reqwest::header::AUTHORIZATION, value);
                    }
                    Err(_) => tracing::warn!("Stored access token is not a valid header value"),
                }
            }
        }
        headers
    }
}

#[async_trait]
impl AvailabilityClient for ReservationApi {
    async fn query(
        &self,
        search: &AvailabilitySearch,
    ) -> Result<Vec<RestaurantAvailability>, AvailabilityError> {
        let response = self
            .client
            .post(&self.config.availabilities_endpoint)
            .headers(self.request_headers().await)
            .json(search)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        decode_availability(status, body)
    }
}

#[async_trait]
impl RestaurantCatalog for ReservationApi {
    async fn restaurants(&self) -> Result<Vec<CatalogRestaurant>, AvailabilityError> {
        let endpoint = self
            .config
            .graphql_endpoint
            .as_deref()
            .ok_or(AvailabilityError::NotConfigured("GRAPHQL_ENDPOINT"))?;
        let query = self
            .config
            .restaurants_query
            .clone()
            .ok_or(AvailabilityError::NotConfigured("RESTAURANTS_QUERY"))?;

        let response = self
            .client
            .post(endpoint)
            .headers(self.request_headers().await)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(query)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        decode_catalog(status, body)
    }
}

/// Turn a raw availability response into slots or a typed failure.
pub fn decode_availability(
    status: u16,
    body: String,
) -> Result<Vec<RestaurantAvailability>, AvailabilityError> {
    if !(200..300).contains(&status) {
        return Err(AvailabilityError::HttpStatus { status, body });
    }
    serde_json::from_str(&body).map_err(|source| AvailabilityError::Decode { source, body })
}

/// Turn a raw catalogue response into restaurants or a typed failure.
pub fn decode_catalog(status: u16, body: String) -> Result<Vec<CatalogRestaurant>, AvailabilityError> {
    if !(200..300).contains(&status) {
        return Err(AvailabilityError::HttpStatus { status, body });
    }
    serde_json::from_str::<CatalogResponse>(&body)
        .map(|r| r.data.activities)
        .map_err(|source| AvailabilityError::Decode { source, body })
}

fn build_static_headers(config: &ApiConfig) -> HeaderMap {
    let mut headers = HeaderMap::new();

    for (name, value) in &config.custom_headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => tracing::warn!(header = %name, "Skipping invalid custom header"),
        }
    }

    if !config.api_key.is_empty() {
        match HeaderValue::from_str(&config.api_key) {
            Ok(value) => {
                headers.insert(HeaderName::from_static("x-api-key"), value);
            }
            Err(_) => tracing::warn!("API key is not a valid header value"),
        }
    }

    headers
}
