use crate::domain::model::{DayFilter, SearchResponse};
use crate::domain::ports::{ConfigProvider, MovieSearch};
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    wish_list_id: &'a str,
    filters: &'a [DayFilter],
}

/// Movie search over HTTP: `POST <endpoint>` with the wishlist id and the
/// reduced filters as JSON.
#[derive(Debug, Clone)]
pub struct HttpMovieSearch {
    client: Client,
    endpoint: String,
}

impl HttpMovieSearch {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// The orchestrator enforces its own deadline; the client one is a
    /// backstop slightly beyond it so connections do not linger.
    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout() + Duration::from_secs(5))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.api_endpoint().to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl MovieSearch for HttpMovieSearch {
    async fn search(
        &self,
        wishlist_id: &str,
        filters: &[DayFilter],
    ) -> Result<Option<SearchResponse>> {
        tracing::debug!("Making API request to: {}", self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .json(&SearchRequest {
                wish_list_id: wishlist_id,
                filters,
            })
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("API response status: {}", status);

        // Error responses carry their message in the body too.
        let body = response.bytes().await?;
        Ok(parse_body(&body))
    }
}

/// An empty, `null` or unreadable body is an absent response.
fn parse_body(body: &[u8]) -> Option<SearchResponse> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return None;
    }

    let value: serde_json::Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Search response is not JSON: {}", e);
            return None;
        }
    };
    if !value.is_object() {
        tracing::warn!("Search response is not an object: {}", value);
        return None;
    }

    match serde_json::from_value(value) {
        Ok(response) => Some(response),
        Err(e) => {
            tracing::warn!("Search response has an unexpected shape: {}", e);
            None
        }
    }
}
