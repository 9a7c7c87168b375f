//! Merge and deduplicate provider reports into a `ScanResult`.
//!
//! `merge` is pure: the same reports always produce the same result, in
//! any order, and successful providers are the only source of records.

use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::Serialize;

use crate::errors::{FailedProvider, FailureKind};
use crate::normalize::{SubdomainRecord, normalize};
use crate::providers::ProviderResult;
use crate::scheduler::ProviderReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProviderStatus {
    Success,
    Failed,
}

/// Per-provider statistics for a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct ProviderStats {
    pub name: String,
    pub status: ProviderStatus,
    /// Hostnames the provider returned before normalization
    pub raw_count: usize,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
}

/// Deduplicated, sorted outcome of one scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct ScanResult {
    pub records: Vec<SubdomainRecord>,
    pub count: usize,
    pub failed_providers: Vec<FailedProvider>,
    pub providers: Vec<ProviderStats>,
    pub all_failed: bool,
}

impl ScanResult {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.providers
            .iter()
            .filter(|p| p.status == ProviderStatus::Success)
            .count()
    }

    /// True when every failure was a cancellation.
    pub fn cancelled(&self) -> bool {
        !self.failed_providers.is_empty()
            && self
                .failed_providers
                .iter()
                .all(|f| f.failure.kind == FailureKind::Cancelled)
    }
}

pub fn merge(reports: &[ProviderReport]) -> ScanResult {
    let mut unique = BTreeSet::new();
    let mut failed_providers = Vec::new();
    let mut providers = Vec::with_capacity(reports.len());

    for report in reports {
        let elapsed_ms = report.elapsed.as_millis() as u64;
        match &report.result {
            ProviderResult::Success(hosts) => {
                unique.extend(hosts.iter().filter_map(|raw| normalize(raw)));
                providers.push(ProviderStats {
                    name: report.provider.clone(),
                    status: ProviderStatus::Success,
                    raw_count: hosts.len(),
                    elapsed_ms,
                    failure: None,
                });
            }
            ProviderResult::Failure(failure) => {
                failed_providers.push(FailedProvider {
                    provider: report.provider.clone(),
                    failure: failure.clone(),
                });
                providers.push(ProviderStats {
                    name: report.provider.clone(),
                    status: ProviderStatus::Failed,
                    raw_count: 0,
                    elapsed_ms,
                    failure: Some(failure.kind),
                });
            }
        }
    }

    let records: Vec<SubdomainRecord> = unique.into_iter().collect();
    ScanResult {
        count: records.len(),
        records,
        all_failed: !reports.iter().any(|r| r.result.is_success()),
        failed_providers,
        providers,
    }
}
