//! Unified error handling.
//!
//! Two layers of failure exist in a scan:
//!   * `ProviderFailure` - the terminal state of a single provider. It is
//!     always converted into metadata and never aborts a scan.
//!   * `ScanError` - what a caller of `Scanner::scan` can observe: invalid
//!     input, total provider failure, cancellation, plus configuration and
//!     output problems raised by the CLI surface.
//!
//! Every `ScanError` maps onto a coarse `ErrorCategory` for structured
//! output and onto a process exit code.
//!
//! Usage:
//!   use subscan::errors::{Result, ScanError};
//!
//!   fn check(input: &str) -> Result<()> {
//!       Err(ScanError::invalid_input(input, "empty domain"))
//!   }

use std::fmt;
use std::io;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// High-level classification for structured reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Input,
    Network,
    Parse,
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCategory::Input => "input",
            ErrorCategory::Network => "network",
            ErrorCategory::Parse => "parse",
            ErrorCategory::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Why a single provider did not produce hostnames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The provider did not answer within its time budget.
    Timeout,
    /// Connection, TLS, redirect or non-success HTTP status.
    Transport,
    /// The body did not have the shape the adapter expects.
    UnparseableResponse,
    /// HTTP 429 or a quota message in the body.
    RateLimited,
    /// The whole scan was cancelled while the provider was in flight.
    Cancelled,
    /// The adapter task panicked.
    Internal,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::Timeout => "timeout",
            FailureKind::Transport => "transport error",
            FailureKind::UnparseableResponse => "unparseable response",
            FailureKind::RateLimited => "rate limited",
            FailureKind::Cancelled => "cancelled",
            FailureKind::Internal => "internal error",
        };
        f.write_str(s)
    }
}

/// Terminal failure of one provider invocation.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[error("{kind}: {message}")]
pub struct ProviderFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl ProviderFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(after: std::time::Duration) -> Self {
        Self::new(
            FailureKind::Timeout,
            format!("no response within {}ms", after.as_millis()),
        )
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Transport, message)
    }

    pub fn unparseable(message: impl Into<String>) -> Self {
        Self::new(FailureKind::UnparseableResponse, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(FailureKind::RateLimited, message)
    }

    pub fn cancelled() -> Self {
        Self::new(FailureKind::Cancelled, "scan cancelled")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Internal, message)
    }
}

/// A failure tagged with the provider that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FailedProvider {
    pub provider: String,
    #[serde(flatten)]
    pub failure: ProviderFailure,
}

impl fmt::Display for FailedProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.provider, self.failure)
    }
}

/// Primary error type surfaced by the scan engine and the CLI.
#[derive(Error, Debug)]
pub enum ScanError {
    // ------------------------ Input / Validation ----------------------------
    #[error("Invalid domain '{input}': {reason}")]
    InvalidInput { input: String, reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    // ----------------------------- Network ----------------------------------
    #[error("All {} provider(s) failed: {}", .failures.len(), join_failures(.failures))]
    AllProvidersFailed { failures: Vec<FailedProvider> },

    #[error("Scan cancelled before any provider completed")]
    Cancelled,

    // ----------------------------- Output / FS ------------------------------
    #[error("Failed to render {format} output: {reason}")]
    Output { format: String, reason: String },

    #[error("I/O error during {operation} on {path}: {source}")]
    Io {
        path: String,
        operation: String,
        #[source]
        source: io::Error,
    },

    // ---------------------------- Internal ----------------------------------
    #[error("Internal error: {message}")]
    Internal { message: String },
}

fn join_failures(failures: &[FailedProvider]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ScanError {
    /// Categorize the error for structured output.
    pub fn category(&self) -> ErrorCategory {
        use ScanError::*;
        match self {
            InvalidInput { .. } | Configuration { .. } => ErrorCategory::Input,
            AllProvidersFailed { failures } => {
                if failures
                    .iter()
                    .all(|f| f.failure.kind == FailureKind::UnparseableResponse)
                {
                    ErrorCategory::Parse
                } else {
                    ErrorCategory::Network
                }
            }
            Cancelled => ErrorCategory::Network,
            Output { .. } | Io { .. } | Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Process exit code the CLI reports for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            ScanError::InvalidInput { .. } | ScanError::Configuration { .. } => 1,
            ScanError::AllProvidersFailed { .. } => 2,
            ScanError::Cancelled => 130,
            ScanError::Output { .. } | ScanError::Io { .. } | ScanError::Internal { .. } => 3,
        }
    }

    // ---------------------------- Constructors -----------------------------

    pub fn invalid_input(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn all_failed(failures: Vec<FailedProvider>) -> Self {
        Self::AllProvidersFailed { failures }
    }

    pub fn output(format: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Output {
            format: format.into(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<String>, operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Public result alias.
pub type Result<T> = std::result::Result<T, ScanError>;

impl From<io::Error> for ScanError {
    fn from(e: io::Error) -> Self {
        ScanError::Io {
            path: "<unknown>".into(),
            operation: "unspecified".into(),
            source: e,
        }
    }
}

/// Errors raised by the optional scan history collaborator.
///
/// These are logged and reported, never turned into a `ScanError`.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("History store I/O failed on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("History entry could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Corrupt history entry at {path}:{line}: {source}")]
    Decode {
        path: String,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Extension trait for enriching IO results with path + operation context.
pub trait IoResultExt<T> {
    fn with_path(self, path: impl Into<String>, operation: impl Into<String>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::result::Result<T, io::Error> {
    fn with_path(self, path: impl Into<String>, operation: impl Into<String>) -> Result<T> {
        self.map_err(|e| ScanError::io(path.into(), operation.into(), e))
    }
}
