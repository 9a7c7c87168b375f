//! Search-index lookup (urlscan.io).
//!
//! `GET /api/v1/search/?q=domain:<domain>` returns `{"results": [...]}`
//! where each hit carries the scanned host in `page.domain`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{ProviderAdapter, ProviderResult, RawHostname, excerpt, get_and_parse, looks_rate_limited};
use crate::errors::ProviderFailure;
use crate::http::HttpClient;

/// Number of hits requested per search.
const PAGE_SIZE: u32 = 1000;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(default)]
    page: Option<PageInfo>,
}

#[derive(Debug, Deserialize)]
struct PageInfo {
    #[serde(default)]
    domain: Option<String>,
}

pub struct UrlScanProvider {
    client: Arc<HttpClient>,
    base_url: String,
}

impl UrlScanProvider {
    pub const NAME: &'static str = "urlscan";

    pub fn new(client: Arc<HttpClient>) -> Self {
        Self {
            client,
            base_url: super::ProviderKind::UrlScan.default_base_url().to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn query_url(&self, domain: &str) -> String {
        let q = format!("domain:{domain}");
        format!(
            "{}/api/v1/search/?q={}&size={PAGE_SIZE}",
            self.base_url,
            urlencoding::encode(&q)
        )
    }
}

#[async_trait]
impl ProviderAdapter for UrlScanProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn fetch(&self, domain: &str, deadline: Duration) -> ProviderResult {
        let url = self.query_url(domain);
        get_and_parse(&self.client, &url, deadline, parse_response).await
    }
}

/// Collect `results[].page.domain`; hits without a page domain are skipped.
pub(crate) fn parse_response(body: &str) -> Result<Vec<RawHostname>, ProviderFailure> {
    let response: SearchResponse = serde_json::from_str(body).map_err(|e| {
        if looks_rate_limited(body) {
            ProviderFailure::rate_limited(excerpt(body))
        } else {
            ProviderFailure::unparseable(format!("invalid urlscan JSON: {e}"))
        }
    })?;

    Ok(response
        .results
        .into_iter()
        .filter_map(|hit| hit.page.and_then(|p| p.domain))
        .collect())
}
