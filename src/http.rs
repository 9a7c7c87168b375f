//! Shared HTTP transport for provider adapters.
//!
//! A single `HttpClient` is built per scanner and handed to every adapter
//! through an `Arc`; adapters never construct their own client. The wrapper
//! translates transport outcomes into the provider failure taxonomy so the
//! adapters only deal with parsing.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::config::HttpConfig;
use crate::errors::{ProviderFailure, Result, ScanError};

/// Maximum number of redirects followed per request.
const MAX_REDIRECTS: usize = 5;

/// Body and status of a successful (2xx) response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    max_body_bytes: usize,
}

impl HttpClient {
    /// Build the client from configuration.
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.connect_timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .tcp_nodelay(true);

        if let Some(ref proxy) = config.proxy {
            let proxy = reqwest::Proxy::all(proxy.as_str())
                .map_err(|e| ScanError::configuration(format!("invalid proxy '{proxy}': {e}")))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| ScanError::internal(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_body_bytes: config.max_body_bytes,
        })
    }

    /// GET `url`, giving up after `deadline`.
    ///
    /// Non-2xx statuses are failures; 429 is reported as rate limiting.
    pub async fn get(
        &self,
        url: &str,
        deadline: Duration,
    ) -> std::result::Result<HttpResponse, ProviderFailure> {
        debug!(url, timeout_ms = deadline.as_millis() as u64, "GET");

        let mut response = self
            .client
            .get(url)
            .timeout(deadline)
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, deadline))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderFailure::rate_limited(format!("HTTP {status}")));
        }
        if !status.is_success() {
            return Err(ProviderFailure::transport(format!("HTTP {status}")));
        }

        let mut bytes: Vec<u8> = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| map_reqwest_error(e, deadline))?
        {
            if bytes.len() + chunk.len() > self.max_body_bytes {
                return Err(ProviderFailure::unparseable(format!(
                    "response body exceeds {} bytes",
                    self.max_body_bytes
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(HttpResponse {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}

fn map_reqwest_error(e: reqwest::Error, deadline: Duration) -> ProviderFailure {
    if e.is_timeout() {
        ProviderFailure::timeout(deadline)
    } else if e.is_decode() || e.is_body() {
        ProviderFailure::unparseable(e.to_string())
    } else {
        ProviderFailure::transport(e.to_string())
    }
}
