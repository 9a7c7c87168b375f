//! Pluggable reconnaissance providers.
//!
//! Every data source implements the same `ProviderAdapter` capability:
//! given a domain and a deadline, produce a `ProviderResult`. Adapters own
//! their query URL and their response parsing; they share nothing except
//! the `HttpClient` handed to them at construction.
//!
//! Adapters never panic or return errors past their boundary. Transport
//! problems, bad status codes, malformed bodies and quota messages all end
//! up as `ProviderResult::Failure`.
//!
//! Usage:
//! ```ignore
//! let client = Arc::new(HttpClient::new(&config.http)?);
//! let adapters = build_adapters(&config.providers, client);
//! for adapter in &adapters {
//!     let result = adapter.fetch("example.com", Duration::from_secs(5)).await;
//! }
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ProvidersConfig;
use crate::errors::ProviderFailure;
use crate::http::HttpClient;

pub mod crtsh;
pub mod hackertarget;
pub mod rapiddns;
pub mod urlscan;

pub use crtsh::CrtShProvider;
pub use hackertarget::HackerTargetProvider;
pub use rapiddns::RapidDnsProvider;
pub use urlscan::UrlScanProvider;

/// Unprocessed hostname as emitted by a provider.
pub type RawHostname = String;

/// Outcome of one adapter invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderResult {
    Success(Vec<RawHostname>),
    Failure(ProviderFailure),
}

impl ProviderResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ProviderResult::Success(_))
    }

    pub fn hostnames(&self) -> &[RawHostname] {
        match self {
            ProviderResult::Success(hosts) => hosts,
            ProviderResult::Failure(_) => &[],
        }
    }

    pub fn failure(&self) -> Option<&ProviderFailure> {
        match self {
            ProviderResult::Success(_) => None,
            ProviderResult::Failure(f) => Some(f),
        }
    }
}

impl From<Result<Vec<RawHostname>, ProviderFailure>> for ProviderResult {
    fn from(r: Result<Vec<RawHostname>, ProviderFailure>) -> Self {
        match r {
            Ok(hosts) => ProviderResult::Success(hosts),
            Err(failure) => ProviderResult::Failure(failure),
        }
    }
}

/// Capability every data source must implement.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Stable short name used in logs and reports.
    fn name(&self) -> &str;

    /// Query the source for hostnames under `domain`.
    async fn fetch(&self, domain: &str, deadline: Duration) -> ProviderResult;
}

/// The providers shipped with subscan, in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    CrtSh,
    HackerTarget,
    RapidDns,
    UrlScan,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::CrtSh,
        ProviderKind::HackerTarget,
        ProviderKind::RapidDns,
        ProviderKind::UrlScan,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ProviderKind::CrtSh => CrtShProvider::NAME,
            ProviderKind::HackerTarget => HackerTargetProvider::NAME,
            ProviderKind::RapidDns => RapidDnsProvider::NAME,
            ProviderKind::UrlScan => UrlScanProvider::NAME,
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            ProviderKind::CrtSh => "https://crt.sh",
            ProviderKind::HackerTarget => "https://api.hackertarget.com",
            ProviderKind::RapidDns => "https://rapiddns.io",
            ProviderKind::UrlScan => "https://urlscan.io",
        }
    }

    /// Environment variable overriding the base URL.
    pub fn env_url_key(self) -> String {
        format!("SUBSCAN_{}_URL", self.name().to_ascii_uppercase())
    }

    /// Instantiate the adapter against `base_url`.
    pub fn build(self, client: Arc<HttpClient>, base_url: &str) -> Arc<dyn ProviderAdapter> {
        match self {
            ProviderKind::CrtSh => Arc::new(CrtShProvider::new(client).with_base_url(base_url)),
            ProviderKind::HackerTarget => {
                Arc::new(HackerTargetProvider::new(client).with_base_url(base_url))
            }
            ProviderKind::RapidDns => {
                Arc::new(RapidDnsProvider::new(client).with_base_url(base_url))
            }
            ProviderKind::UrlScan => Arc::new(UrlScanProvider::new(client).with_base_url(base_url)),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Build every enabled adapter, preserving registration order.
pub fn build_adapters(
    config: &ProvidersConfig,
    client: Arc<HttpClient>,
) -> Vec<Arc<dyn ProviderAdapter>> {
    config
        .enabled()
        .map(|p| p.kind.build(Arc::clone(&client), &p.base_url))
        .collect()
}

/// GET `url` through the shared client and hand the body to `parse`.
pub(crate) async fn get_and_parse<F>(
    client: &HttpClient,
    url: &str,
    deadline: Duration,
    parse: F,
) -> ProviderResult
where
    F: FnOnce(&str) -> Result<Vec<RawHostname>, ProviderFailure>,
{
    match client.get(url, deadline).await {
        Ok(response) => parse(&response.body).into(),
        Err(failure) => ProviderResult::Failure(failure),
    }
}

/// Provider quota / throttling messages seen in response bodies.
static RATE_LIMIT_MARKERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)rate[ _-]?limit|too many requests|api count exceeded|quota exceeded|increase quota")
        .expect("rate limit pattern is valid")
});

pub(crate) fn looks_rate_limited(body: &str) -> bool {
    RATE_LIMIT_MARKERS.is_match(body)
}

/// Short excerpt of a body for failure messages.
pub(crate) fn excerpt(body: &str) -> String {
    const MAX: usize = 80;
    let line = body.trim().lines().next().unwrap_or("").trim();
    if line.chars().count() > MAX {
        let cut: String = line.chars().take(MAX).collect();
        format!("{cut}...")
    } else {
        line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;

    #[test]
    fn provider_names_are_stable() {
        let names: Vec<_> = ProviderKind::ALL.iter().map(|k| k.name()).collect();
        assert_eq!(names, vec!["crtsh", "hackertarget", "rapiddns", "urlscan"]);
        assert_eq!(ProviderKind::HackerTarget.env_url_key(), "SUBSCAN_HACKERTARGET_URL");
    }

    #[test]
    fn build_adapters_respects_order_and_toggles() {
        let client = Arc::new(HttpClient::new(&HttpConfig::default()).unwrap());
        let mut config = ProvidersConfig::default();
        config.set_enabled(ProviderKind::HackerTarget, false);

        let adapters = build_adapters(&config, client);
        let names: Vec<_> = adapters.iter().map(|a| a.name().to_string()).collect();
        assert_eq!(names, vec!["crtsh", "rapiddns", "urlscan"]);
    }

    #[test]
    fn rate_limit_markers() {
        assert!(looks_rate_limited(
            "API count exceeded - Increase Quota with Membership"
        ));
        assert!(looks_rate_limited("<h1>429 Too Many Requests</h1>"));
        assert!(looks_rate_limited("{\"error\": \"ratelimit reached\"}"));
        assert!(!looks_rate_limited("www.example.com,93.184.216.34"));
    }

    #[test]
    fn excerpt_is_bounded() {
        let long = "x".repeat(200);
        assert_eq!(excerpt(&long).len(), 83);
        assert_eq!(excerpt("  first\nsecond"), "first");
    }

    #[test]
    fn result_accessors() {
        let ok = ProviderResult::Success(vec!["a.example.com".into()]);
        assert!(ok.is_success());
        assert_eq!(ok.hostnames().len(), 1);
        assert!(ok.failure().is_none());

        let err = ProviderResult::from(Err(ProviderFailure::unparseable("bad")));
        assert!(!err.is_success());
        assert!(err.hostnames().is_empty());
        assert!(err.failure().is_some());
    }
}
