//! Certificate transparency search (crt.sh).
//!
//! `GET /?q=%25.<domain>&output=json` returns a JSON array of certificate
//! records. Each record's `name_value` holds one or more names joined by
//! newlines, frequently wildcard-prefixed.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{ProviderAdapter, ProviderResult, RawHostname, excerpt, get_and_parse, looks_rate_limited};
use crate::errors::ProviderFailure;
use crate::http::HttpClient;

#[derive(Debug, Deserialize)]
struct CertificateEntry {
    name_value: String,
}

pub struct CrtShProvider {
    client: Arc<HttpClient>,
    base_url: String,
}

impl CrtShProvider {
    pub const NAME: &'static str = "crtsh";

    pub fn new(client: Arc<HttpClient>) -> Self {
        Self {
            client,
            base_url: super::ProviderKind::CrtSh.default_base_url().to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn query_url(&self, domain: &str) -> String {
        let q = format!("%.{domain}");
        format!(
            "{}/?q={}&output=json",
            self.base_url,
            urlencoding::encode(&q)
        )
    }
}

#[async_trait]
impl ProviderAdapter for CrtShProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn fetch(&self, domain: &str, deadline: Duration) -> ProviderResult {
        let url = self.query_url(domain);
        get_and_parse(&self.client, &url, deadline, parse_response).await
    }
}

/// Parse a crt.sh JSON body into raw names.
pub(crate) fn parse_response(body: &str) -> Result<Vec<RawHostname>, ProviderFailure> {
    let entries: Vec<CertificateEntry> = serde_json::from_str(body).map_err(|e| {
        if looks_rate_limited(body) {
            ProviderFailure::rate_limited(excerpt(body))
        } else {
            ProviderFailure::unparseable(format!("invalid crt.sh JSON: {e}"))
        }
    })?;

    Ok(entries
        .iter()
        .flat_map(|entry| entry.name_value.lines())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;
    use crate::errors::FailureKind;

    #[test]
    fn splits_multi_value_names() {
        let body = r#"[
            {"issuer_name": "C=US, O=Let's Encrypt", "name_value": "*.example.com\nexample.com"},
            {"name_value": "mail.example.com"}
        ]"#;
        let names = parse_response(body).unwrap();
        assert_eq!(names, vec!["*.example.com", "example.com", "mail.example.com"]);
    }

    #[test]
    fn empty_array_is_success() {
        assert!(parse_response("[]").unwrap().is_empty());
    }

    #[test]
    fn missing_name_value_is_parse_failure() {
        let err = parse_response(r#"[{"common_name": "example.com"}]"#).unwrap_err();
        assert_eq!(err.kind, FailureKind::UnparseableResponse);
    }

    #[test]
    fn html_error_page_is_parse_failure() {
        let err = parse_response("<html><body>502 Bad Gateway</body></html>").unwrap_err();
        assert_eq!(err.kind, FailureKind::UnparseableResponse);
    }

    #[test]
    fn throttle_page_is_rate_limited() {
        let err = parse_response("Too Many Requests, slow down").unwrap_err();
        assert_eq!(err.kind, FailureKind::RateLimited);
    }

    #[test]
    fn query_url_encodes_wildcard() {
        let client = Arc::new(HttpClient::new(&HttpConfig::default()).unwrap());
        let provider = CrtShProvider::new(client).with_base_url("http://localhost:1234/");
        assert_eq!(
            provider.query_url("example.com"),
            "http://localhost:1234/?q=%25.example.com&output=json"
        );
    }
}
