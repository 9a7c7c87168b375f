//! High-level application orchestration layer.
//!
//! This module provides the CLI-facing `App` façade. It layers the
//! configuration, validates the target, runs one scan and renders either
//! structured (JSON/YAML) or human-oriented output (styled / plain /
//! batch).
//!
//! Major steps in `App::run`:
//!   1. Schema generation early-exit
//!   2. Config load / validation
//!   3. Input validation
//!   4. Scan with Ctrl-C cancellation
//!   5. Structured output (JSON/YAML) or styled/plain fallback
//!
//! Scan failures are rendered here and turned into an exit code; only
//! output failures escape as errors.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::cli::{Cli, OutputFormat};
use crate::config::Config;
use crate::domain_utils::Domain;
use crate::errors::{Result, ScanError};
use crate::merge::ScanResult;
use crate::output;
use crate::scanner::Scanner;
use crate::structured_output::ScanOutput;
use crate::styled_output::StyledFormatter;

/// Application façade.
pub struct App;

impl App {
    /// Execute one scan end to end.
    ///
    /// Returns: intended process exit code (0 = success, 1 = input or
    /// configuration error, 2 = all providers failed, 130 = cancelled).
    pub async fn run(cli: &Cli) -> Result<i32> {
        if Self::maybe_print_schema(cli)? {
            return Ok(0);
        }

        let raw_input = cli.domain.as_deref().unwrap_or_default();
        let started = Instant::now();

        let config = match Self::load_config(cli) {
            Ok(config) => config,
            Err(e) => return Self::report_failure(cli, raw_input, &e, started.elapsed()),
        };

        let domain = match Domain::parse(raw_input) {
            Ok(domain) => domain,
            Err(e) => return Self::report_failure(cli, raw_input, &e, started.elapsed()),
        };

        let cancel = CancellationToken::new();
        let scanner = match Scanner::from_config(&config) {
            Ok(scanner) => scanner.with_cancellation(cancel.clone()),
            Err(e) => return Self::report_failure(cli, raw_input, &e, started.elapsed()),
        };

        let interrupt = Self::cancel_on_ctrl_c(cancel);
        let outcome = scanner.scan(domain.as_str()).await;
        interrupt.abort();

        match outcome {
            Ok(result) => {
                Self::render(cli, &config, raw_input, &domain, &result, started.elapsed())?;
                Ok(0)
            }
            Err(e) => Self::report_failure(cli, raw_input, &e, started.elapsed()),
        }
    }

    fn maybe_print_schema(cli: &Cli) -> Result<bool> {
        if !cli.generate_schema {
            return Ok(false);
        }
        let schema = ScanOutput::generate_json_schema()
            .map_err(|e| ScanError::output("json-schema", e.to_string()))?;
        println!("{schema}");
        Ok(true)
    }

    /// Defaults, then environment, then flags.
    fn load_config(cli: &Cli) -> Result<Config> {
        let mut config = Config::from_env();
        config.merge_with_cli(cli);
        config.validate()?;
        Ok(config)
    }

    fn cancel_on_ctrl_c(token: CancellationToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling scan");
                token.cancel();
            }
        })
    }

    fn render(
        cli: &Cli,
        config: &Config,
        raw_input: &str,
        domain: &Domain,
        result: &ScanResult,
        elapsed: Duration,
    ) -> Result<()> {
        match cli.format {
            OutputFormat::Json | OutputFormat::Yaml => {
                let document = ScanOutput::from_scan(raw_input, domain.as_str(), result, elapsed);
                Self::print_structured(cli.format, &document)
            }
            OutputFormat::Text => {
                let formatter = if config.output.color {
                    StyledFormatter::new()
                } else {
                    StyledFormatter::without_colors()
                };
                formatter
                    .print_scan(domain.as_str(), result, elapsed)
                    .map_err(|e| ScanError::output("text", e.to_string()))
            }
            OutputFormat::Plain | OutputFormat::Batch => {
                let formatter = output::create_formatter(cli.format)
                    .ok_or_else(|| ScanError::internal("no line formatter for format"))?;
                let text = formatter
                    .format_results(domain.as_str(), result)
                    .map_err(|e| ScanError::output("plain", e.to_string()))?;
                print!("{text}");

                if result.is_empty() && cli.error_enabled() {
                    eprintln!("No subdomains found for {domain}.");
                }
                Ok(())
            }
        }
    }

    fn print_structured(format: OutputFormat, document: &ScanOutput) -> Result<()> {
        let rendered = match format {
            OutputFormat::Yaml => document
                .to_yaml()
                .map_err(|e| ScanError::output("yaml", e.to_string()))?,
            _ => document
                .to_json()
                .map_err(|e| ScanError::output("json", e.to_string()))?,
        };
        println!("{rendered}");
        Ok(())
    }

    /// Render a scan failure and pick its exit code.
    fn report_failure(
        cli: &Cli,
        raw_input: &str,
        error: &ScanError,
        elapsed: Duration,
    ) -> Result<i32> {
        if cli.is_structured_output() {
            let document = ScanOutput::from_error(raw_input, error, elapsed);
            Self::print_structured(cli.format, &document)?;
        } else if cli.error_enabled() {
            eprintln!("Error: {error}");
        }
        Ok(error.exit_code())
    }
}
