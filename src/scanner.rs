//! Scan coordination: the public entry point of the engine.
//!
//! `Scanner::scan` validates the input domain, fans out to every
//! configured provider, merges what came back and decides whether the
//! outcome is a result set or a structured failure. The scanner holds no
//! mutable state between scans.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::domain_utils::Domain;
use crate::errors::{Result, ScanError};
use crate::history::{JsonlHistory, ScanHistory};
use crate::http::HttpClient;
use crate::merge::{ScanResult, merge};
use crate::providers::{ProviderAdapter, build_adapters};
use crate::scheduler::FanOutScheduler;

pub struct Scanner {
    adapters: Vec<Arc<dyn ProviderAdapter>>,
    per_provider_timeout: Duration,
    history: Option<Arc<dyn ScanHistory>>,
    cancel: CancellationToken,
}

impl Scanner {
    pub fn new(adapters: Vec<Arc<dyn ProviderAdapter>>, per_provider_timeout: Duration) -> Self {
        Self {
            adapters,
            per_provider_timeout,
            history: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Build the shared HTTP client, the enabled adapters and the optional
    /// history store from a validated configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let client = Arc::new(HttpClient::new(&config.http)?);
        let mut scanner = Self::new(
            build_adapters(&config.providers, client),
            config.scan.provider_timeout,
        );
        if let Some(ref path) = config.history.path {
            scanner = scanner.with_history(Arc::new(JsonlHistory::new(path)));
        }
        Ok(scanner)
    }

    pub fn with_history(mut self, history: Arc<dyn ScanHistory>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    pub fn per_provider_timeout(&self) -> Duration {
        self.per_provider_timeout
    }

    /// Discover subdomains of `domain_input`.
    ///
    /// Errors:
    /// - `InvalidInput` before any provider is contacted
    /// - `Configuration` when the scanner has no adapters
    /// - `AllProvidersFailed` when no provider succeeded
    /// - `Cancelled` when the scan token fired and nothing succeeded
    pub async fn scan(&self, domain_input: &str) -> Result<ScanResult> {
        let domain = Domain::parse(domain_input)?;
        if self.adapters.is_empty() {
            return Err(ScanError::configuration("No providers enabled"));
        }
        if domain.is_subdomain() {
            info!(
                domain = domain.as_str(),
                registrable = domain.registrable().unwrap_or_default(),
                "Scanning below a subdomain"
            );
        }

        info!(
            domain = domain.as_str(),
            providers = self.adapters.len(),
            "Starting subdomain scan"
        );

        let scheduler = FanOutScheduler::new(self.per_provider_timeout)
            .with_cancellation(self.cancel.clone());
        let reports = scheduler.run_all(domain.as_str(), &self.adapters).await;
        let result = merge(&reports);

        if result.all_failed {
            if result.cancelled() {
                warn!(domain = domain.as_str(), "Scan cancelled");
                return Err(ScanError::Cancelled);
            }
            warn!(
                domain = domain.as_str(),
                failed = result.failed_providers.len(),
                "Every provider failed"
            );
            return Err(ScanError::all_failed(result.failed_providers));
        }

        info!(
            domain = domain.as_str(),
            records = result.count,
            failed = result.failed_providers.len(),
            "Scan finished"
        );

        if let Some(ref history) = self.history {
            Self::record_history(Arc::clone(history), domain.as_str(), &result).await;
        }

        Ok(result)
    }

    /// History stores do blocking I/O, so the write runs on the blocking pool.
    async fn record_history(history: Arc<dyn ScanHistory>, domain: &str, result: &ScanResult) {
        let owned_domain = domain.to_string();
        let snapshot = result.clone();
        let outcome =
            tokio::task::spawn_blocking(move || history.record(&owned_domain, &snapshot)).await;

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(domain, "Could not record scan history: {}", e),
            Err(e) => warn!(domain, "History task aborted: {}", e),
        }
    }
}
