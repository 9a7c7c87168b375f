//! Line-oriented output for scripts and pipelines.
//!
//! `plain` prints one hostname per line, `batch` prints a single
//! `domain:host1,host2` line. Styled text lives in `styled_output`, JSON
//! and YAML in `structured_output`.

use std::io;

use crate::cli::OutputFormat;
use crate::merge::ScanResult;

/// Renders a finished scan as text.
pub trait OutputFormatter {
    /// Render the result for `domain`
    fn format_results(&self, domain: &str, result: &ScanResult) -> io::Result<String>;
}

/// One hostname per line, nothing else.
pub struct PlainFormatter;

impl OutputFormatter for PlainFormatter {
    fn format_results(&self, _domain: &str, result: &ScanResult) -> io::Result<String> {
        let mut output = String::new();
        for record in &result.records {
            output.push_str(record.as_str());
            output.push('\n');
        }
        Ok(output)
    }
}

/// Batch output formatter
pub struct BatchFormatter;

impl OutputFormatter for BatchFormatter {
    fn format_results(&self, domain: &str, result: &ScanResult) -> io::Result<String> {
        let hosts: Vec<&str> = result.records.iter().map(|r| r.as_str()).collect();
        Ok(format!("{}:{}\n", domain, hosts.join(",")))
    }
}

/// Line formatter for `format`, if it is a line-oriented one.
pub fn create_formatter(format: OutputFormat) -> Option<Box<dyn OutputFormatter>> {
    match format {
        OutputFormat::Plain => Some(Box::new(PlainFormatter)),
        OutputFormat::Batch => Some(Box::new(BatchFormatter)),
        OutputFormat::Text | OutputFormat::Json | OutputFormat::Yaml => None,
    }
}
