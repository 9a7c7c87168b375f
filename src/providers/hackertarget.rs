//! Passive DNS host search (HackerTarget).
//!
//! `GET /hostsearch/?q=<domain>` answers with plain text, one `host,ip`
//! pair per line. Errors and quota notices come back as a single line of
//! text with a 200 status, so the body is inspected before it is split.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::{ProviderAdapter, ProviderResult, RawHostname, excerpt, get_and_parse, looks_rate_limited};
use crate::errors::ProviderFailure;
use crate::http::HttpClient;

pub struct HackerTargetProvider {
    client: Arc<HttpClient>,
    base_url: String,
}

impl HackerTargetProvider {
    pub const NAME: &'static str = "hackertarget";

    pub fn new(client: Arc<HttpClient>) -> Self {
        Self {
            client,
            base_url: super::ProviderKind::HackerTarget
                .default_base_url()
                .to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn query_url(&self, domain: &str) -> String {
        format!(
            "{}/hostsearch/?q={}",
            self.base_url,
            urlencoding::encode(domain)
        )
    }
}

#[async_trait]
impl ProviderAdapter for HackerTargetProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn fetch(&self, domain: &str, deadline: Duration) -> ProviderResult {
        let url = self.query_url(domain);
        get_and_parse(&self.client, &url, deadline, parse_response).await
    }
}

/// Parse the CSV body; the hostname is the first field of each line.
///
/// A body with no `host,ip` line at all is a notice (quota, error, empty
/// zone). Notices are only recognised then, so hostnames that happen to
/// read like one stay records.
pub(crate) fn parse_response(body: &str) -> Result<Vec<RawHostname>, ProviderFailure> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    if !trimmed.lines().any(|line| line.contains(',')) {
        return classify_notice(trimmed);
    }

    let hosts: Vec<RawHostname> = trimmed
        .lines()
        .filter_map(|line| line.split_once(','))
        .map(|(host, _)| host.trim().to_string())
        .filter(|host| !host.is_empty())
        .collect();

    if hosts.is_empty() {
        return Err(ProviderFailure::unparseable(format!(
            "no hostnames in response: {}",
            excerpt(trimmed)
        )));
    }
    Ok(hosts)
}

fn classify_notice(text: &str) -> Result<Vec<RawHostname>, ProviderFailure> {
    let lower = text.to_ascii_lowercase();
    if lower.starts_with("no records found") || lower.starts_with("no dns a records found") {
        return Ok(Vec::new());
    }
    if looks_rate_limited(text) {
        return Err(ProviderFailure::rate_limited(excerpt(text)));
    }
    if lower.starts_with("error") {
        return Err(ProviderFailure::unparseable(excerpt(text)));
    }
    Err(ProviderFailure::unparseable(format!(
        "no host,ip lines in response: {}",
        excerpt(text)
    )))
}
