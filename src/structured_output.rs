//! Structured output module for JSON and YAML serialization.
//!
//! `ScanOutput` is the single document emitted for `--format json|yaml`,
//! both for successful scans and for failures. Its JSON schema is what
//! `--generate-schema` prints.

use std::time::Duration;

use anyhow::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::{ErrorCategory, FailedProvider, FailureKind, ScanError};
use crate::merge::{ProviderStatus, ScanResult};

/// Version of the document layout below.
pub const SCHEMA_VERSION: &str = "1.0";

/// Root structure for all subscan output in structured formats
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct ScanOutput {
    /// Tool version and metadata
    pub metadata: OutputMetadata,

    /// What was scanned
    pub input: InputInfo,

    /// Discovered subdomains, sorted and deduplicated
    pub subdomains: Vec<String>,

    /// Outcome of every configured provider, in registration order
    pub providers: Vec<ProviderEntry>,

    /// Scan statistics
    pub statistics: ScanStatistics,

    /// Fatal error, when the scan did not produce a result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,

    /// Success status and result summary
    pub result: ResultSummary,
}

/// Tool metadata and versioning information
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct OutputMetadata {
    /// Tool name
    pub tool_name: String,

    /// Tool version
    pub version: String,

    /// Timestamp when the scan finished
    pub generated_at: chrono::DateTime<chrono::Utc>,

    /// JSON schema version for this output format
    pub schema_version: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct InputInfo {
    /// Input exactly as given on the command line
    pub raw: String,

    /// Normalized domain, when the input was valid
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

/// Outcome of one provider.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct ProviderEntry {
    pub name: String,
    pub succeeded: bool,
    /// Hostnames returned before normalization
    pub raw_count: usize,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct FailureInfo {
    pub kind: FailureKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct ScanStatistics {
    /// Wall-clock time of the whole scan in milliseconds
    pub total_time_ms: u64,
    pub providers_queried: usize,
    pub providers_succeeded: usize,
    pub providers_failed: usize,
    pub timeouts: usize,
    pub rate_limited: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct ErrorInfo {
    pub category: ErrorCategory,
    pub message: String,
    pub exit_code: i32,
}

/// Result summary and status
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct ResultSummary {
    /// Overall success status
    pub success: bool,

    /// Number of subdomains found
    pub subdomains_found: usize,

    /// True when at least one provider failed but the scan still succeeded
    pub partial: bool,
}

impl ScanOutput {
    /// Create an empty document with basic metadata
    pub fn new(raw_input: &str) -> Self {
        Self {
            metadata: OutputMetadata {
                tool_name: crate::NAME.to_string(),
                version: crate::VERSION.to_string(),
                generated_at: chrono::Utc::now(),
                schema_version: SCHEMA_VERSION.to_string(),
            },
            input: InputInfo {
                raw: raw_input.to_string(),
                domain: None,
            },
            subdomains: Vec::new(),
            providers: Vec::new(),
            statistics: ScanStatistics::default(),
            error: None,
            result: ResultSummary::default(),
        }
    }

    /// Document for a completed scan.
    pub fn from_scan(raw_input: &str, domain: &str, result: &ScanResult, elapsed: Duration) -> Self {
        let mut output = Self::new(raw_input);
        output.input.domain = Some(domain.to_string());
        output.subdomains = result.records.iter().map(|r| r.to_string()).collect();

        output.providers = result
            .providers
            .iter()
            .map(|stats| ProviderEntry {
                name: stats.name.clone(),
                succeeded: stats.status == ProviderStatus::Success,
                raw_count: stats.raw_count,
                elapsed_ms: stats.elapsed_ms,
                failure: result
                    .failed_providers
                    .iter()
                    .find(|f| f.provider == stats.name)
                    .map(|f| FailureInfo {
                        kind: f.failure.kind,
                        message: f.failure.message.clone(),
                    }),
            })
            .collect();

        output.finish_statistics(elapsed);
        output.result = ResultSummary {
            success: true,
            subdomains_found: result.count,
            partial: !result.failed_providers.is_empty(),
        };
        output
    }

    /// Document for a scan that ended in `error`.
    pub fn from_error(raw_input: &str, error: &ScanError, elapsed: Duration) -> Self {
        let mut output = Self::new(raw_input);

        if let ScanError::AllProvidersFailed { failures } = error {
            output.providers = failures.iter().map(failed_entry).collect();
        }

        output.finish_statistics(elapsed);
        output.error = Some(ErrorInfo {
            category: error.category(),
            message: error.to_string(),
            exit_code: error.exit_code(),
        });
        output
    }

    fn finish_statistics(&mut self, elapsed: Duration) {
        let count_kind = |kind: FailureKind| {
            self.providers
                .iter()
                .filter(|p| p.failure.as_ref().map(|f| f.kind) == Some(kind))
                .count()
        };
        let succeeded = self.providers.iter().filter(|p| p.succeeded).count();

        self.statistics = ScanStatistics {
            total_time_ms: elapsed.as_millis() as u64,
            providers_queried: self.providers.len(),
            providers_succeeded: succeeded,
            providers_failed: self.providers.len() - succeeded,
            timeouts: count_kind(FailureKind::Timeout),
            rate_limited: count_kind(FailureKind::RateLimited),
        };
    }

    /// Generate JSON schema for this output format
    pub fn generate_json_schema() -> Result<String> {
        let schema = schemars::schema_for!(ScanOutput);
        Ok(serde_json::to_string_pretty(&schema)?)
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

fn failed_entry(failed: &FailedProvider) -> ProviderEntry {
    ProviderEntry {
        name: failed.provider.clone(),
        succeeded: false,
        raw_count: 0,
        elapsed_ms: 0,
        failure: Some(FailureInfo {
            kind: failed.failure.kind,
            message: failed.failure.message.clone(),
        }),
    }
}
