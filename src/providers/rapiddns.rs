//! Historical DNS scraper (RapidDNS).
//!
//! `GET /subdomain/<domain>?full=1` serves an HTML page whose result table
//! lists one hostname per row. Hostnames are pulled out of the markup with
//! a pattern anchored on the target domain, so navigation links and page
//! chrome never leak into the results.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;

use super::{ProviderAdapter, ProviderResult, RawHostname, excerpt, get_and_parse, looks_rate_limited};
use crate::errors::ProviderFailure;
use crate::http::HttpClient;

pub struct RapidDnsProvider {
    client: Arc<HttpClient>,
    base_url: String,
}

impl RapidDnsProvider {
    pub const NAME: &'static str = "rapiddns";

    pub fn new(client: Arc<HttpClient>) -> Self {
        Self {
            client,
            base_url: super::ProviderKind::RapidDns.default_base_url().to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn query_url(&self, domain: &str) -> String {
        format!(
            "{}/subdomain/{}?full=1",
            self.base_url,
            urlencoding::encode(domain)
        )
    }
}

#[async_trait]
impl ProviderAdapter for RapidDnsProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn fetch(&self, domain: &str, deadline: Duration) -> ProviderResult {
        let url = self.query_url(domain);
        get_and_parse(&self.client, &url, deadline, |body| {
            parse_response(domain, body)
        })
        .await
    }
}

/// Extract every `<label>.<domain>` occurrence from the page.
pub(crate) fn parse_response(domain: &str, body: &str) -> Result<Vec<RawHostname>, ProviderFailure> {
    if !body.contains('<') {
        if looks_rate_limited(body) {
            return Err(ProviderFailure::rate_limited(excerpt(body)));
        }
        return Err(ProviderFailure::unparseable(format!(
            "expected HTML, got: {}",
            excerpt(body)
        )));
    }

    let pattern = host_pattern(domain)?;
    let hosts: Vec<RawHostname> = pattern
        .captures_iter(body)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect();

    if hosts.is_empty() && looks_rate_limited(body) {
        return Err(ProviderFailure::rate_limited("throttle page returned"));
    }
    Ok(hosts)
}

fn host_pattern(domain: &str) -> Result<Regex, ProviderFailure> {
    let pattern = format!(
        r"(?i)([a-z0-9_*][a-z0-9_*.-]*\.{})(?:[^a-z0-9.-]|$)",
        regex::escape(domain)
    );
    Regex::new(&pattern).map_err(|e| ProviderFailure::internal(format!("bad host pattern: {e}")))
}
