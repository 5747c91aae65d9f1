//! HTTP client for the answer service

use super::error::ClientError;
use crate::config::ServiceSettings;
use crate::models::{Answer, ErrorResponse, SearchRequest, SearchResponse};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

/// Anything that can turn a query into an answer.
///
/// Implementations are stateless with respect to the caller: one call, one
/// outcome, nothing retained.
#[async_trait]
pub trait SearchService: Send + Sync {
    async fn execute(&self, query: &str) -> std::result::Result<Answer, ClientError>;
}

/// reqwest-backed client that POSTs each query to a fixed endpoint
#[derive(Clone)]
pub struct HttpSearchClient {
    client: Client,
    endpoint: String,
}

impl HttpSearchClient {
    /// Create a new client with default settings
    pub fn new() -> Result<Self> {
        Self::with_settings(&ServiceSettings::default())
    }

    /// Create a new client with custom settings
    pub fn with_settings(settings: &ServiceSettings) -> Result<Self> {
        settings.validate()?;

        let mut headers = reqwest::header::HeaderMap::new();
        for (key, value) in &settings.extra_headers {
            headers.insert(
                reqwest::header::HeaderName::from_bytes(key.as_bytes())?,
                reqwest::header::HeaderValue::from_str(value)?,
            );
        }

        let mut builder = Client::builder()
            .user_agent(settings.user_agent.clone())
            .default_headers(headers)
            .gzip(true)
            .brotli(true);

        if let Some(secs) = settings.request_timeout {
            builder = builder.timeout(Duration::from_secs_f64(secs));
        }

        Ok(Self {
            client: builder.build()?,
            endpoint: settings.endpoint.clone(),
        })
    }

    /// Endpoint queries are sent to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Map a response into an answer or a client error
    async fn parse_response(response: Response) -> std::result::Result<Answer, ClientError> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            let body: SearchResponse = serde_json::from_str(&text)
                .map_err(|e| ClientError::MalformedResponse(e.to_string()))?;
            return body.into_answer();
        }

        Err(ClientError::Service(service_message(status, &text)))
    }
}

#[async_trait]
impl SearchService for HttpSearchClient {
    async fn execute(&self, query: &str) -> std::result::Result<Answer, ClientError> {
        debug!("Sending query to {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&SearchRequest::new(query))
            .send()
            .await
            .map_err(|e| {
                warn!("Request to {} failed: {}", self.endpoint, e);
                ClientError::from(e)
            })?;

        let outcome = Self::parse_response(response).await;
        match &outcome {
            Ok(answer) => debug!("Received answer with {} sources", answer.sources.len()),
            Err(e) => warn!("Search failed: {}", e),
        }
        outcome
    }
}

/// Server-supplied error text, or a generic message naming the status
fn service_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|e| e.error)
        .filter(|msg| !msg.trim().is_empty())
        .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()))
}
