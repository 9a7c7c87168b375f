use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::providers::ProviderKind;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Styled, human-readable summary
    Text,
    /// One hostname per line
    Plain,
    /// Single line "domain:host1,host2"
    Batch,
    /// JSON document
    Json,
    /// YAML document
    Yaml,
}

/// Command-line interface definition.
/// Queries several public reconnaissance sources concurrently and prints
/// the merged, deduplicated subdomain list.
///
/// Verbosity levels:
/// 0 - silent (only final output)
/// 1 - errors (default)
/// 2 - warnings + errors
/// 3 - provider outcomes
/// 5 - trace/debug
#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Discover subdomains of a domain from certificate transparency, passive DNS and search indexes"
)]
pub struct Cli {
    /// Target domain (e.g. example.com). Required unless --generate-schema is provided.
    #[arg(required_unless_present = "generate_schema")]
    pub domain: Option<String>,

    /// Per-provider timeout in seconds (default 5)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Disable colors in text output
    #[arg(long)]
    pub no_color: bool,

    /// Skip the crt.sh certificate transparency search
    #[arg(long = "no-crtsh")]
    pub no_crtsh: bool,

    /// Skip the HackerTarget host search
    #[arg(long = "no-hackertarget")]
    pub no_hackertarget: bool,

    /// Skip the RapidDNS scraper
    #[arg(long = "no-rapiddns")]
    pub no_rapiddns: bool,

    /// Skip the urlscan.io search index
    #[arg(long = "no-urlscan")]
    pub no_urlscan: bool,

    /// Append each successful scan to this JSON-lines file
    #[arg(long, value_name = "FILE")]
    pub history: Option<PathBuf>,

    /// Route provider requests through this proxy URL
    #[arg(long, value_name = "URL")]
    pub proxy: Option<String>,

    /// Verbosity level (0,1,2,3,5)
    #[arg(long, default_value_t = 1)]
    pub verbose: u8,

    /// Print the JSON schema of the structured output and exit
    #[arg(long)]
    pub generate_schema: bool,
}

impl Cli {
    /// Parse CLI arguments from process args.
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Providers switched off on the command line.
    pub fn disabled_providers(&self) -> impl Iterator<Item = ProviderKind> + '_ {
        ProviderKind::ALL
            .into_iter()
            .filter(move |kind| match kind {
                ProviderKind::CrtSh => self.no_crtsh,
                ProviderKind::HackerTarget => self.no_hackertarget,
                ProviderKind::RapidDns => self.no_rapiddns,
                ProviderKind::UrlScan => self.no_urlscan,
            })
    }

    /// JSON or YAML requested?
    pub fn is_structured_output(&self) -> bool {
        matches!(self.format, OutputFormat::Json | OutputFormat::Yaml)
    }

    /// Are error-level messages enabled?
    pub fn error_enabled(&self) -> bool {
        self.verbose >= 1
    }

    /// Default tracing filter for the chosen verbosity; `RUST_LOG` overrides it.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "off",
            1 => "error",
            2 => "warn",
            3 | 4 => "info",
            _ => "trace",
        }
    }
}
