//! Subscan Library
//!
//! A Rust library for discovering the subdomains of a domain by querying
//! several public reconnaissance sources concurrently. This library
//! provides functionality to:
//!
//! - Validate and normalize a target domain
//! - Query certificate transparency, passive DNS, DNS scrapers and search
//!   indexes in parallel, each under its own deadline
//! - Normalize and deduplicate heterogeneous results into one sorted list
//! - Tolerate partial provider failure and report it as metadata
//!
//! # Example
//!
//! ```rust,no_run
//! use subscan::config::Config;
//! use subscan::scanner::Scanner;
//!
//! # async fn demo() -> subscan::Result<()> {
//! let scanner = Scanner::from_config(&Config::from_env())?;
//! let result = scanner.scan("example.com").await?;
//! for record in &result.records {
//!     println!("{record}");
//! }
//! # Ok(())
//! # }
//! ```

// Re-export all modules for library use
pub mod app;
pub mod cli;
pub mod config;
pub mod domain_utils;
pub mod errors;
pub mod history;
pub mod http;
pub mod merge;
pub mod normalize;
pub mod output;
pub mod providers;
pub mod scanner;
pub mod scheduler;
pub mod structured_output;
pub mod styled_output;

// Re-export commonly used types and functions for convenience
pub use errors::{FailureKind, ProviderFailure, Result, ScanError};
pub use history::{JsonlHistory, ScanHistory};
pub use merge::{ScanResult, merge};
pub use normalize::{SubdomainRecord, normalize};
pub use providers::{ProviderAdapter, ProviderKind, ProviderResult};
pub use scanner::Scanner;
pub use scheduler::{FanOutScheduler, ProviderReport};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
