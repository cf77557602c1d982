use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::sta::query::{EntityKind, LogicalRequest, QueryParams};

/// Failure classes of a single fetch. None of these are retried here.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// DNS, connection, timeout or body read failure.
    #[error("Transport failure: {0}")]
    Transport(#[source] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Request { status: u16, body: String },

    /// The body was not valid JSON.
    #[error("Failed to parse response: {0}")]
    Decode(#[source] serde_json::Error),
}

impl FetchError {
    /// Substitute payload used in place of a failed fetch, so downstream code
    /// never has to branch on a missing document.
    pub fn empty_envelope(kind: EntityKind) -> Value {
        if kind.is_collection() {
            json!({ "value": [] })
        } else {
            json!({})
        }
    }
}

pub struct SensorThingsClient {
    http_client: Client,
    base_url: String,
    default_timeout: Duration,
}

impl SensorThingsClient {
    /// Build a client for the configured service root.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Internal` if the TLS backend cannot be initialised.
    pub fn new(config: &Config) -> AppResult<Self> {
        let http_client = Client::builder()
            .user_agent(concat!("sensor-explorer/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: config.sta_base_url.trim_end_matches('/').to_string(),
            default_timeout: Duration::from_secs(config.sta_timeout_seconds),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch a logical request with the configured default timeout.
    ///
    /// # Errors
    ///
    /// See [`SensorThingsClient::fetch`].
    pub async fn fetch_request(&self, request: &LogicalRequest) -> Result<Value, FetchError> {
        self.fetch(
            &request.resource_path(),
            &request.query_params(),
            self.default_timeout,
        )
        .await
    }

    /// GET `<base_url>/<resource_path>` and parse the body as JSON.
    ///
    /// # Errors
    ///
    /// - `FetchError::Transport` on network failure or when `timeout` elapses
    /// - `FetchError::Request` on a non-success status
    /// - `FetchError::Decode` if the body is not JSON
    pub async fn fetch(
        &self,
        resource_path: &str,
        params: &QueryParams,
        timeout: Duration,
    ) -> Result<Value, FetchError> {
        let url = format!("{}/{}", self.base_url, resource_path.trim_start_matches('/'));

        tracing::debug!(url = %url, params = ?params, "sta_fetch");

        let response = self
            .http_client
            .get(&url)
            .query(params)
            .timeout(timeout)
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Request {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let text = response.text().await.map_err(FetchError::Transport)?;

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                resource = %resource_path,
                body_preview = %text.chars().take(500).collect::<String>(),
                "Failed to parse SensorThings response"
            );
            FetchError::Decode(e)
        })
    }
}
